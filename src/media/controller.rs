//! Playback state controller
//!
//! Owns the single authoritative `is_playing` belief for the UI. Every local
//! play/pause flips the belief optimistically before dispatch, races the fast
//! key channel against the session gateway (fallback only on dispatch
//! failure), and reverts only when both paths fail. A periodic reconciliation
//! pass adopts the session gateway's transport state, but is suppressed for a
//! window after each local command because the OS can report stale state for
//! up to ~10 seconds after a command it accepted.

use crate::error::Result;
use crate::media::keys::CommandChannel;
use crate::media::session::{MediaInfo, SessionGateway};
use crate::sync::clock::{Clock, SuppressionGate, SystemClock};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Session-state propagation after a command can lag this long, so
/// reconciliation is skipped for the same interval after each local command
pub const DEFAULT_SUPPRESSION_WINDOW: Duration = Duration::from_secs(10);

struct Belief {
    is_playing: bool,
    gate: SuppressionGate,
}

/// Optimistic play/pause controller over the two command channels
///
/// All entry points take `&self` and are safe to invoke repeatedly from the
/// shell's timer; the belief mutex is never held across a channel or
/// session-gateway call, so a slow fallback round trip cannot block reads.
pub struct PlaybackController<C, S, K = SystemClock>
where
    C: CommandChannel,
    S: SessionGateway,
    K: Clock,
{
    channel: C,
    session: Mutex<S>,
    clock: K,
    belief: Mutex<Belief>,
    events: Option<Sender<bool>>,
}

impl<C, S> PlaybackController<C, S, SystemClock>
where
    C: CommandChannel,
    S: SessionGateway,
{
    pub fn new(channel: C, session: S, suppression_window: Duration) -> Self {
        Self::with_clock(channel, session, suppression_window, SystemClock)
    }
}

impl<C, S, K> PlaybackController<C, S, K>
where
    C: CommandChannel,
    S: SessionGateway,
    K: Clock,
{
    pub fn with_clock(channel: C, session: S, suppression_window: Duration, clock: K) -> Self {
        Self {
            channel,
            session: Mutex::new(session),
            clock,
            belief: Mutex::new(Belief {
                is_playing: false,
                gate: SuppressionGate::new(suppression_window),
            }),
            events: None,
        }
    }

    /// Register the channel that receives the new `is_playing` belief after
    /// every state transition, at most once per transition
    pub fn set_event_channel(&mut self, events: Sender<bool>) {
        self.events = Some(events);
    }

    /// Acquire the session gateway and seed the belief from one transport
    /// query
    ///
    /// Always returns true: commands still work over the fast channel when
    /// the session manager is unavailable.
    pub fn initialize(&mut self) -> bool {
        let session = self.session.get_mut();
        if session.initialize() {
            if let Ok(playing) = session.is_playing() {
                self.belief.get_mut().is_playing = playing;
            }
            info!(
                "playback controller initialized, initial state: {}",
                if self.belief.get_mut().is_playing {
                    "playing"
                } else {
                    "paused"
                }
            );
        } else {
            warn!("session gateway unavailable, media key commands only");
        }
        true
    }

    /// Current playback belief
    pub fn is_playing(&self) -> bool {
        self.belief.lock().is_playing
    }

    /// Toggle playback
    ///
    /// The belief flips and observers are notified before anything is
    /// dispatched; the flip is reverted (with a second notification) only
    /// when the fast channel fails to dispatch AND the session fallback
    /// fails.
    pub fn play_pause(&self) {
        let optimistic = {
            let mut belief = self.belief.lock();
            belief.is_playing = !belief.is_playing;
            belief.gate.record_command(self.clock.now());
            belief.is_playing
        };
        debug!(
            "play/pause: optimistically {}",
            if optimistic { "playing" } else { "paused" }
        );
        self.notify(optimistic);

        if self.channel.send_play_pause() {
            return;
        }

        debug!("fast channel dispatch failed, falling back to session gateway");
        if let Err(e) = self.session.lock().play_pause() {
            warn!("session fallback failed, reverting: {}", e);
            let reverted = {
                let mut belief = self.belief.lock();
                belief.is_playing = !belief.is_playing;
                belief.is_playing
            };
            self.notify(reverted);
        }
    }

    /// Skip to the next track; does not touch the playback belief
    pub fn next(&self) {
        if self.channel.send_next() {
            return;
        }
        if let Err(e) = self.session.lock().next() {
            warn!("next track failed on both channels: {}", e);
        }
    }

    /// Skip to the previous track; does not touch the playback belief
    pub fn previous(&self) {
        if self.channel.send_previous() {
            return;
        }
        if let Err(e) = self.session.lock().previous() {
            warn!("previous track failed on both channels: {}", e);
        }
    }

    /// Reconcile the belief against the session gateway's transport state
    ///
    /// Invoked periodically by the shell. A no-op while the suppression
    /// window after a local command is open, and a no-op (without
    /// notification) when the gateway agrees with the belief.
    pub fn refresh_playback_state(&self) {
        let now = self.clock.now();
        {
            let belief = self.belief.lock();
            if belief.gate.is_suppressed(now) {
                debug!(
                    "skipping state refresh, {:?} since last command",
                    belief.gate.elapsed_since_command(now)
                );
                return;
            }
        }

        let actual = match self.session.lock().is_playing() {
            Ok(actual) => actual,
            Err(e) => {
                debug!("state refresh unavailable: {}", e);
                return;
            }
        };

        let changed = {
            let mut belief = self.belief.lock();
            if belief.is_playing != actual {
                belief.is_playing = actual;
                true
            } else {
                false
            }
        };
        if changed {
            info!(
                "state adopted from session gateway: {}",
                if actual { "playing" } else { "paused" }
            );
            self.notify(actual);
        }
    }

    /// Title/artist of the current track, if any session is active
    pub fn media_info(&self) -> Option<MediaInfo> {
        self.session.lock().media_info()
    }

    /// Whether the session gateway sees an active session
    pub fn has_active_session(&self) -> bool {
        self.session.lock().has_active_session()
    }

    fn notify(&self, is_playing: bool) {
        if let Some(events) = &self.events {
            if events.send(is_playing).is_err() {
                warn!("playback event receiver dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MinivolError;
    use crate::sync::clock::ManualClock;
    use crossbeam_channel::{unbounded, Receiver};
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeChannel {
        dispatch_ok: AtomicBool,
        sends: AtomicU32,
    }

    impl CommandChannel for Arc<FakeChannel> {
        fn send_play_pause(&self) -> bool {
            self.sends.fetch_add(1, Ordering::SeqCst);
            self.dispatch_ok.load(Ordering::SeqCst)
        }
        fn send_next(&self) -> bool {
            self.sends.fetch_add(1, Ordering::SeqCst);
            self.dispatch_ok.load(Ordering::SeqCst)
        }
        fn send_previous(&self) -> bool {
            self.sends.fetch_add(1, Ordering::SeqCst);
            self.dispatch_ok.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct FakeSession {
        /// None simulates "no active session"
        playing: Mutex<Option<bool>>,
        command_ok: AtomicBool,
        commands: AtomicU32,
    }

    impl SessionGateway for Arc<FakeSession> {
        fn initialize(&mut self) -> bool {
            true
        }

        fn play_pause(&self) -> Result<()> {
            self.commands.fetch_add(1, Ordering::SeqCst);
            if self.command_ok.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(MinivolError::NoActiveSession)
            }
        }

        fn next(&self) -> Result<()> {
            self.commands.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn previous(&self) -> Result<()> {
            self.commands.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn is_playing(&self) -> Result<bool> {
            self.playing.lock().ok_or(MinivolError::NoActiveSession)
        }

        fn media_info(&self) -> Option<MediaInfo> {
            None
        }

        fn has_active_session(&self) -> bool {
            self.playing.lock().is_some()
        }
    }

    struct Harness {
        controller:
            PlaybackController<Arc<FakeChannel>, Arc<FakeSession>, Arc<ManualClock>>,
        channel: Arc<FakeChannel>,
        session: Arc<FakeSession>,
        clock: Arc<ManualClock>,
        events: Receiver<bool>,
    }

    fn harness() -> Harness {
        let channel = Arc::new(FakeChannel::default());
        let session = Arc::new(FakeSession::default());
        let clock = Arc::new(ManualClock::new());
        let (tx, events) = unbounded();

        let mut controller = PlaybackController::with_clock(
            channel.clone(),
            session.clone(),
            Duration::from_secs(10),
            clock.clone(),
        );
        controller.set_event_channel(tx);

        Harness {
            controller,
            channel,
            session,
            clock,
            events,
        }
    }

    fn drain(events: &Receiver<bool>) -> Vec<bool> {
        events.try_iter().collect()
    }

    #[test]
    fn play_pause_flips_optimistically_with_one_notification() {
        let h = harness();
        h.channel.dispatch_ok.store(true, Ordering::SeqCst);

        h.controller.play_pause();

        assert!(h.controller.is_playing());
        assert_eq!(drain(&h.events), vec![true]);
        // Fast path succeeded, session never consulted
        assert_eq!(h.session.commands.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn fast_channel_failure_falls_back_to_session() {
        let h = harness();
        h.channel.dispatch_ok.store(false, Ordering::SeqCst);
        h.session.command_ok.store(true, Ordering::SeqCst);

        h.controller.play_pause();

        assert!(h.controller.is_playing());
        assert_eq!(drain(&h.events), vec![true]);
        assert_eq!(h.session.commands.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn double_failure_reverts_with_a_second_notification() {
        let h = harness();
        // Both channels fail

        h.controller.play_pause();

        assert!(!h.controller.is_playing());
        assert_eq!(drain(&h.events), vec![true, false]);
    }

    #[test]
    fn reconciliation_is_suppressed_inside_the_window() {
        let h = harness();
        h.channel.dispatch_ok.store(true, Ordering::SeqCst);
        *h.session.playing.lock() = Some(false);

        h.controller.play_pause();
        drain(&h.events);

        // 3s later the session still disagrees; must be a no-op
        h.clock.advance(Duration::from_secs(3));
        h.controller.refresh_playback_state();
        assert!(h.controller.is_playing());
        assert!(drain(&h.events).is_empty());

        // Past the window, the gateway's value wins
        h.clock.advance(Duration::from_secs(8));
        h.controller.refresh_playback_state();
        assert!(!h.controller.is_playing());
        assert_eq!(drain(&h.events), vec![false]);
    }

    #[test]
    fn agreeing_refresh_fires_no_notification() {
        let h = harness();
        *h.session.playing.lock() = Some(false);

        h.controller.refresh_playback_state();

        assert!(!h.controller.is_playing());
        assert!(drain(&h.events).is_empty());
    }

    #[test]
    fn refresh_without_session_keeps_the_belief() {
        // Accepted false positive: fast dispatch "succeeds" with no player
        // running, and the belief stays playing indefinitely because the
        // gateway has nothing to reconcile against.
        let h = harness();
        h.channel.dispatch_ok.store(true, Ordering::SeqCst);

        h.controller.play_pause();
        drain(&h.events);

        h.clock.advance(Duration::from_secs(30));
        h.controller.refresh_playback_state();
        h.clock.advance(Duration::from_secs(30));
        h.controller.refresh_playback_state();

        assert!(h.controller.is_playing());
        assert!(drain(&h.events).is_empty());
    }

    #[test]
    fn skip_commands_do_not_touch_the_belief() {
        let h = harness();
        h.channel.dispatch_ok.store(false, Ordering::SeqCst);

        h.controller.next();
        h.controller.previous();

        assert!(!h.controller.is_playing());
        assert!(drain(&h.events).is_empty());
        // Fallback used for both
        assert_eq!(h.session.commands.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn initialize_seeds_the_belief_from_the_session() {
        let channel = Arc::new(FakeChannel::default());
        let session = Arc::new(FakeSession::default());
        *session.playing.lock() = Some(true);

        let mut controller = PlaybackController::new(
            channel,
            session,
            DEFAULT_SUPPRESSION_WINDOW,
        );
        assert!(controller.initialize());
        assert!(controller.is_playing());
    }
}
