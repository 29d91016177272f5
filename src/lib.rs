//! Hammer and chisel vignette.
//!
//! Each click strikes the chisel and drives it one step along the cut; once
//! every step is done a completion popup appears. The [`controller`] holds
//! the whole interaction and is independent of any renderer; [`widget`]
//! (druid window) and [`console`] (terminal) are the two frontends that
//! drive it.

pub mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod math;
pub mod popup;
pub mod scene;
pub mod schedule;
#[cfg(feature = "gui")]
pub mod state;
#[cfg(feature = "gui")]
pub mod widget;

pub use config::SceneConfig;
pub use controller::{Activation, Controller, Phase};
pub use error::ConfigError;
pub use popup::{PopupKind, PopupState, PopupTexts};
pub use scene::{Element, Feedback, Rgb, Scene, SceneModel, StrikeCue};
