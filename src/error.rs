//! Unified error types for minivol

use thiserror::Error;

/// Main error type for minivol operations
#[derive(Error, Debug)]
pub enum MinivolError {
    /// No default audio render endpoint could be resolved
    #[error("no audio render endpoint available: {0}")]
    NoDevice(String),

    /// Reading volume/mute state from the endpoint failed
    #[error("endpoint query failed: {0}")]
    Query(String),

    /// Writing volume/mute state to the endpoint failed
    #[error("endpoint write failed: {0}")]
    Write(String),

    /// No media session is currently active
    #[error("no active media session")]
    NoActiveSession,

    /// The session manager could not be acquired or is unavailable
    #[error("media session manager unavailable: {0}")]
    SessionManager(String),

    /// A transport command was rejected by the active session
    #[error("media session command failed: {0}")]
    SessionCommand(String),

    /// Fast-channel media key signal could not be dispatched
    #[error("media key dispatch failed: {0}")]
    Dispatch(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for minivol operations
pub type Result<T> = std::result::Result<T, MinivolError>;

impl MinivolError {
    /// Check if this error is recoverable (the next periodic refresh or
    /// command attempt may succeed without intervention)
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, MinivolError::InvalidConfig(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_platform_failures_are_recoverable() {
        assert!(MinivolError::NoDevice("unplugged".into()).is_recoverable());
        assert!(MinivolError::NoActiveSession.is_recoverable());
        assert!(!MinivolError::InvalidConfig("bad interval".into()).is_recoverable());
    }
}
