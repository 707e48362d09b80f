//! Session-aware media transport gateway
//!
//! Slower than the key channel (session manager negotiation) but can query
//! the actual transport state and report command success. "No active
//! session" is an expected outcome here, not an exceptional one.

use crate::error::Result;

/// Title/artist pair for the current track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInfo {
    pub title: String,
    pub artist: String,
}

/// Acknowledged, query-capable command path via the OS media session manager
pub trait SessionGateway {
    /// Acquire the session manager; failure is non-fatal, the applet keeps
    /// working with the fast channel only
    fn initialize(&mut self) -> bool;

    /// Toggle playback by querying the transport first: pause when playing,
    /// play otherwise. Avoids double-triggering play when optimistic state
    /// elsewhere is already out of sync.
    fn play_pause(&self) -> Result<()>;

    /// Skip to the next track
    fn next(&self) -> Result<()>;

    /// Skip to the previous track
    fn previous(&self) -> Result<()>;

    /// Query the transport state directly; reconciliation only, not the
    /// hot path
    fn is_playing(&self) -> Result<bool>;

    /// Title and artist of the current track, if a session is active
    fn media_info(&self) -> Option<MediaInfo>;

    /// Whether any media session is currently active
    fn has_active_session(&self) -> bool;
}

#[cfg(windows)]
pub use windows_impl::SmtcGateway;

#[cfg(windows)]
mod windows_impl {
    use super::{MediaInfo, SessionGateway};
    use crate::error::{MinivolError, Result};
    use tracing::{debug, warn};
    use windows::Media::Control::{
        GlobalSystemMediaTransportControlsSession,
        GlobalSystemMediaTransportControlsSessionManager,
        GlobalSystemMediaTransportControlsSessionPlaybackStatus,
    };

    /// System Media Transport Controls implementation of the session gateway
    ///
    /// Holds the lazily-acquired session manager; sessions themselves are
    /// re-queried per call since the foreground player can change at any
    /// time.
    #[derive(Default)]
    pub struct SmtcGateway {
        manager: Option<GlobalSystemMediaTransportControlsSessionManager>,
    }

    // SAFETY: SMTC WinRT objects are agile and safe to use across threads
    unsafe impl Send for SmtcGateway {}

    impl SmtcGateway {
        pub fn new() -> Self {
            Self::default()
        }

        fn active_session(&self) -> Result<GlobalSystemMediaTransportControlsSession> {
            let manager = self
                .manager
                .as_ref()
                .ok_or_else(|| MinivolError::SessionManager("not initialized".into()))?;
            manager
                .GetCurrentSession()
                .map_err(|_| MinivolError::NoActiveSession)
        }

        fn session_is_playing(
            session: &GlobalSystemMediaTransportControlsSession,
        ) -> Result<bool> {
            let status = session
                .GetPlaybackInfo()
                .and_then(|info| info.PlaybackStatus())
                .map_err(|e| MinivolError::Query(e.to_string()))?;
            Ok(status == GlobalSystemMediaTransportControlsSessionPlaybackStatus::Playing)
        }
    }

    impl SessionGateway for SmtcGateway {
        fn initialize(&mut self) -> bool {
            let manager = GlobalSystemMediaTransportControlsSessionManager::RequestAsync()
                .and_then(|op| op.get());
            match manager {
                Ok(manager) => {
                    debug!("session manager acquired");
                    self.manager = Some(manager);
                    true
                }
                Err(e) => {
                    warn!("failed to acquire session manager: {}", e);
                    false
                }
            }
        }

        fn play_pause(&self) -> Result<()> {
            let session = self.active_session()?;
            // Toggle by query, not blind toggle
            let accepted = if Self::session_is_playing(&session)? {
                session
                    .TryPauseAsync()
                    .and_then(|op| op.get())
                    .map_err(|e| MinivolError::SessionCommand(e.to_string()))?
            } else {
                session
                    .TryPlayAsync()
                    .and_then(|op| op.get())
                    .map_err(|e| MinivolError::SessionCommand(e.to_string()))?
            };
            if accepted {
                Ok(())
            } else {
                Err(MinivolError::SessionCommand(
                    "session rejected play/pause".into(),
                ))
            }
        }

        fn next(&self) -> Result<()> {
            let session = self.active_session()?;
            let accepted = session
                .TrySkipNextAsync()
                .and_then(|op| op.get())
                .map_err(|e| MinivolError::SessionCommand(e.to_string()))?;
            if accepted {
                Ok(())
            } else {
                Err(MinivolError::SessionCommand("session rejected skip".into()))
            }
        }

        fn previous(&self) -> Result<()> {
            let session = self.active_session()?;
            let accepted = session
                .TrySkipPreviousAsync()
                .and_then(|op| op.get())
                .map_err(|e| MinivolError::SessionCommand(e.to_string()))?;
            if accepted {
                Ok(())
            } else {
                Err(MinivolError::SessionCommand("session rejected skip".into()))
            }
        }

        fn is_playing(&self) -> Result<bool> {
            let session = self.active_session()?;
            Self::session_is_playing(&session)
        }

        fn media_info(&self) -> Option<MediaInfo> {
            let session = self.active_session().ok()?;
            let props = session
                .TryGetMediaPropertiesAsync()
                .and_then(|op| op.get())
                .map_err(|e| debug!("media properties unavailable: {}", e))
                .ok()?;

            Some(MediaInfo {
                title: props
                    .Title()
                    .map(|s| s.to_string_lossy())
                    .unwrap_or_default(),
                artist: props
                    .Artist()
                    .map(|s| s.to_string_lossy())
                    .unwrap_or_default(),
            })
        }

        fn has_active_session(&self) -> bool {
            self.active_session().is_ok()
        }
    }
}
