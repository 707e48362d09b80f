//! Media transport control: fast command channel, session gateway and the
//! playback state controller

pub mod controller;
pub mod keys;
pub mod session;

pub use controller::{PlaybackController, DEFAULT_SUPPRESSION_WINDOW};
pub use keys::CommandChannel;
pub use session::{MediaInfo, SessionGateway};

#[cfg(windows)]
pub use keys::AppCommandChannel;
#[cfg(windows)]
pub use session::SmtcGateway;
