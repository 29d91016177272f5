use druid::Data;

/// Window-level application state
#[derive(Clone, Data)]
pub struct AppState {
    /// Show the debug overlay
    pub debug: bool,
    /// Frames and delayed tasks are frozen
    pub paused: bool,
}

impl AppState {
    pub fn new(debug: bool) -> Self {
        AppState {
            debug,
            paused: false,
        }
    }
}
