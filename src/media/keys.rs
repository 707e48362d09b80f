//! Fast, fire-and-forget media key channel
//!
//! Injects `WM_APPCOMMAND` media signals into whatever window currently owns
//! foreground input focus. Sub-millisecond, requires no session negotiation,
//! and gives no acknowledgement: a `true` return means the signal was
//! dispatched, not that any application acted on it.

/// Unacknowledged low-latency command path to the foreground application
pub trait CommandChannel {
    /// Dispatch a play/pause toggle signal
    fn send_play_pause(&self) -> bool;

    /// Dispatch a next-track signal
    fn send_next(&self) -> bool;

    /// Dispatch a previous-track signal
    fn send_previous(&self) -> bool;
}

#[cfg(windows)]
pub use windows_impl::AppCommandChannel;

#[cfg(windows)]
mod windows_impl {
    use super::CommandChannel;
    use tracing::{debug, warn};
    use windows::Win32::Foundation::{LPARAM, WPARAM};
    use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, SendMessageW};

    const WM_APPCOMMAND: u32 = 0x0319;
    const APPCOMMAND_MEDIA_NEXTTRACK: isize = 11;
    const APPCOMMAND_MEDIA_PREVIOUSTRACK: isize = 12;
    const APPCOMMAND_MEDIA_PLAY_PAUSE: isize = 14;

    /// `WM_APPCOMMAND` implementation of the fast channel
    #[derive(Debug, Clone, Copy, Default)]
    pub struct AppCommandChannel;

    impl AppCommandChannel {
        fn send(&self, command: isize, name: &str) -> bool {
            unsafe {
                let hwnd = GetForegroundWindow();
                if hwnd.0.is_null() {
                    warn!("no foreground window for {}", name);
                    return false;
                }
                // The app command travels in the high word of lParam
                SendMessageW(hwnd, WM_APPCOMMAND, WPARAM(0), LPARAM(command << 16));
                debug!("WM_APPCOMMAND {} sent", name);
                true
            }
        }
    }

    impl CommandChannel for AppCommandChannel {
        fn send_play_pause(&self) -> bool {
            self.send(APPCOMMAND_MEDIA_PLAY_PAUSE, "play/pause")
        }

        fn send_next(&self) -> bool {
            self.send(APPCOMMAND_MEDIA_NEXTTRACK, "next track")
        }

        fn send_previous(&self) -> bool {
            self.send(APPCOMMAND_MEDIA_PREVIOUSTRACK, "previous track")
        }
    }
}
