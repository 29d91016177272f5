use anyhow::{Context, Result};
use chisel::{console, Controller, PopupTexts, SceneConfig};
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chisel", version)]
#[command(about = "Hammer and chisel interactive vignette", long_about = None)]
struct Args {
    /// Scene configuration (TOML); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Popup texts (JSON), overriding the path in the configuration
    #[arg(long)]
    texts: Option<PathBuf>,

    /// Number of strikes needed to finish the cut
    #[arg(long)]
    steps: Option<u32>,

    /// Run in the terminal instead of opening a window (always on without the `gui` feature)
    #[arg(long, default_value_t = false)]
    console: bool,

    /// Verbose logging and the debug overlay
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Do not ring the terminal bell on strikes (console only)
    #[arg(long, default_value_t = false)]
    silent: bool,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn setup_logging(args: &Args) -> Result<()> {
    let level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("druid=warn".parse()?);

    match &args.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        // Anything written to the terminal would tear the alternate screen.
        None if args.console => {}
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn load_texts(args: &Args, config: &SceneConfig) -> PopupTexts {
    let path = args.texts.as_ref().or(config.assets.popup_texts.as_ref());
    match path {
        Some(path) => PopupTexts::load(path).unwrap_or_else(|err| {
            warn!(path = %path.display(), %err, "popup texts unavailable, popups will be empty");
            PopupTexts::default()
        }),
        None => PopupTexts::builtin(),
    }
}

/// Main function
pub fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args)?;

    let mut config = match &args.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };
    if let Some(steps) = args.steps {
        config.chisel.total_steps = steps;
    }

    let texts = load_texts(&args, &config);
    let controller = Controller::new(&config, texts).context("invalid scene configuration")?;

    if args.console || cfg!(not(feature = "gui")) {
        console::run(&config, controller, !args.silent)?;
        return Ok(());
    }

    #[cfg(feature = "gui")]
    run_window(&config, controller, args.debug)?;

    Ok(())
}

#[cfg(feature = "gui")]
fn run_window(config: &SceneConfig, controller: Controller, debug: bool) -> Result<()> {
    use chisel::state::AppState;
    use chisel::widget::VignetteWidget;
    use druid::{AppLauncher, WindowDesc};

    tracing::info!(
        width = config.scene.width,
        height = config.scene.height,
        "opening window"
    );
    let main_window = WindowDesc::new(VignetteWidget::new(config, controller))
        .title(config.scene.title.clone())
        .window_size((f64::from(config.scene.width), f64::from(config.scene.height)))
        .resizable(false);

    AppLauncher::with_window(main_window)
        .launch(AppState::new(debug))
        .map_err(|err| anyhow::anyhow!("failed to launch window: {err}"))?;

    Ok(())
}
