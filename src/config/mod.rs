//! CLI arguments and persisted applet settings

pub mod args;
pub mod settings;

pub use args::{Args, Command};
pub use settings::AppSettings;
