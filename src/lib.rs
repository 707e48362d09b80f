//! minivol - mini volume and media control applet for Windows
//!
//! Core state reconciliation engine behind an always-on-top volume/media
//! widget: a write-through cache mirroring the default audio endpoint and a
//! dual-channel play/pause controller with optimistic local state.

pub mod audio;
pub mod config;
pub mod error;
pub mod media;
#[cfg(windows)]
pub mod platform;
pub mod sync;

pub use error::{MinivolError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
