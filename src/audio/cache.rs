//! Cached volume/mute state mirroring the default render endpoint
//!
//! Getting change events for the system volume is unreliable, so this cache
//! serves reads locally and reconciles with the OS on a periodic refresh
//! driven by the shell. Writes are optimistic: the cache updates to the
//! requested value whether or not the endpoint write succeeded, so the UI
//! never lags a slider the user just dragged. Reads from the OS are
//! authoritative and overwrite any optimistic value.

use crate::audio::endpoint::EndpointGateway;
use parking_lot::Mutex;
use std::time::Instant;
use tracing::{debug, warn};

/// Snapshot of the cached volume/mute tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeState {
    /// Last value written to or read from the endpoint, percent 0..=100.
    /// `None` means unknown (no refresh has succeeded since the endpoint
    /// was lost).
    pub volume_percent: Option<u32>,
    /// Last known mute state, `None` when unknown
    pub muted: Option<bool>,
    /// Whether a resolved endpoint handle is currently cached
    pub endpoint_valid: bool,
    /// When the cache last reconciled successfully with the OS
    pub last_refreshed: Option<Instant>,
}

struct CacheInner<H> {
    volume_percent: Option<u32>,
    muted: Option<bool>,
    endpoint: Option<H>,
    last_refreshed: Option<Instant>,
}

impl<H> Default for CacheInner<H> {
    fn default() -> Self {
        Self {
            volume_percent: None,
            muted: None,
            endpoint: None,
            last_refreshed: None,
        }
    }
}

/// Write-through volume/mute cache over an endpoint gateway
///
/// Safe to call from multiple threads; the cached tuple sits behind one
/// mutex which is never held across a gateway call.
pub struct VolumeCache<G: EndpointGateway> {
    gateway: G,
    inner: Mutex<CacheInner<G::Handle>>,
}

impl<G: EndpointGateway> VolumeCache<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Current volume percent from cache (0..=100)
    ///
    /// A cold or invalidated cache forces one synchronous refresh first;
    /// if that also fails, 0 is reported and the next read tries again.
    pub fn current_volume(&self) -> u32 {
        if let Some(volume) = self.inner.lock().volume_percent {
            return volume;
        }
        self.refresh_from_system();
        self.inner.lock().volume_percent.unwrap_or(0)
    }

    /// Current mute state from cache, with the same cold-start behavior
    /// as `current_volume`
    pub fn is_muted(&self) -> bool {
        if let Some(muted) = self.inner.lock().muted {
            return muted;
        }
        self.refresh_from_system();
        self.inner.lock().muted.unwrap_or(false)
    }

    /// Set the system volume to the given percent, clamped to 0..=100
    ///
    /// The cache is updated to the requested value regardless of whether the
    /// endpoint write succeeded; the periodic refresh converges it back to
    /// the OS truth if the write was lost.
    pub fn set_volume(&self, percent: u32) {
        let percent = percent.min(100);
        debug!(percent, "set volume");

        match self.ensure_endpoint() {
            Some(handle) => {
                if let Err(e) = self.gateway.set_volume(&handle, percent as f32 / 100.0) {
                    warn!("volume write failed: {}", e);
                }
            }
            None => warn!("set volume: no audio endpoint available"),
        }

        self.inner.lock().volume_percent = Some(percent);
    }

    /// Set the system mute state, with the same write-through policy
    /// as `set_volume`
    pub fn set_muted(&self, muted: bool) {
        debug!(muted, "set mute");

        match self.ensure_endpoint() {
            Some(handle) => {
                if let Err(e) = self.gateway.set_mute(&handle, muted) {
                    warn!("mute write failed: {}", e);
                }
            }
            None => warn!("set mute: no audio endpoint available"),
        }

        self.inner.lock().muted = Some(muted);
    }

    /// Re-resolve the default endpoint and overwrite the cache with the
    /// OS-reported values; called periodically by the shell
    ///
    /// When the endpoint cannot be resolved the whole tuple becomes unknown
    /// rather than keeping stale values: after a device swap the old level
    /// must not be shown for a different device.
    pub fn refresh_from_system(&self) {
        let handle = match self.gateway.resolve_endpoint() {
            Ok(handle) => handle,
            Err(e) => {
                warn!("refresh: no audio endpoint available: {}", e);
                let mut inner = self.inner.lock();
                inner.volume_percent = None;
                inner.muted = None;
                inner.endpoint = None;
                inner.last_refreshed = None;
                return;
            }
        };

        let volume = self.gateway.volume(&handle);
        let muted = self.gateway.mute(&handle);

        let mut inner = self.inner.lock();
        inner.volume_percent = match volume {
            Ok(level) => Some((level.clamp(0.0, 1.0) * 100.0).round() as u32),
            Err(e) => {
                warn!("refresh: volume query failed: {}", e);
                None
            }
        };
        inner.muted = match muted {
            Ok(muted) => Some(muted),
            Err(e) => {
                warn!("refresh: mute query failed: {}", e);
                None
            }
        };
        inner.endpoint = Some(handle);
        inner.last_refreshed = Some(Instant::now());
    }

    /// Snapshot of the cached state
    pub fn state(&self) -> VolumeState {
        let inner = self.inner.lock();
        VolumeState {
            volume_percent: inner.volume_percent,
            muted: inner.muted,
            endpoint_valid: inner.endpoint.is_some(),
            last_refreshed: inner.last_refreshed,
        }
    }

    /// Reuse the cached endpoint handle or resolve a fresh one
    fn ensure_endpoint(&self) -> Option<G::Handle> {
        if let Some(handle) = self.inner.lock().endpoint.clone() {
            return Some(handle);
        }
        match self.gateway.resolve_endpoint() {
            Ok(handle) => {
                self.inner.lock().endpoint = Some(handle.clone());
                Some(handle)
            }
            Err(e) => {
                debug!("endpoint resolution failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MinivolError;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;

    /// Gateway double with switchable failure modes and call counters
    #[derive(Default)]
    struct FakeGateway {
        volume: Mutex<f32>,
        muted: Mutex<bool>,
        no_device: AtomicBool,
        fail_writes: AtomicBool,
        resolve_calls: AtomicU32,
        write_calls: AtomicU32,
    }

    impl FakeGateway {
        fn shared() -> Arc<Self> {
            Arc::new(Self::default())
        }
    }

    impl EndpointGateway for Arc<FakeGateway> {
        type Handle = ();

        fn resolve_endpoint(&self) -> crate::Result<()> {
            self.resolve_calls.fetch_add(1, Ordering::SeqCst);
            if self.no_device.load(Ordering::SeqCst) {
                return Err(MinivolError::NoDevice("gone".into()));
            }
            Ok(())
        }

        fn volume(&self, _: &()) -> crate::Result<f32> {
            Ok(*self.volume.lock())
        }

        fn set_volume(&self, _: &(), level: f32) -> crate::Result<()> {
            self.write_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(MinivolError::Write("denied".into()));
            }
            *self.volume.lock() = level;
            Ok(())
        }

        fn mute(&self, _: &()) -> crate::Result<bool> {
            Ok(*self.muted.lock())
        }

        fn set_mute(&self, _: &(), mute: bool) -> crate::Result<()> {
            self.write_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(MinivolError::Write("denied".into()));
            }
            *self.muted.lock() = mute;
            Ok(())
        }
    }

    #[test]
    fn cold_start_read_forces_refresh() {
        let gateway = FakeGateway::shared();
        *gateway.volume.lock() = 0.4;
        let cache = VolumeCache::new(gateway.clone());

        assert_eq!(cache.current_volume(), 40);
        assert_eq!(gateway.resolve_calls.load(Ordering::SeqCst), 1);

        // Second read is served from cache
        assert_eq!(cache.current_volume(), 40);
        assert_eq!(gateway.resolve_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn set_volume_is_write_through_even_on_gateway_failure() {
        let gateway = FakeGateway::shared();
        gateway.fail_writes.store(true, Ordering::SeqCst);
        let cache = VolumeCache::new(gateway.clone());

        cache.set_volume(75);
        assert_eq!(cache.current_volume(), 75);
        assert_eq!(gateway.write_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn set_volume_caches_even_without_a_device() {
        let gateway = FakeGateway::shared();
        gateway.no_device.store(true, Ordering::SeqCst);
        let cache = VolumeCache::new(gateway.clone());

        cache.set_volume(30);
        assert_eq!(cache.state().volume_percent, Some(30));
        assert_eq!(gateway.write_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn out_of_range_volume_is_clamped() {
        let gateway = FakeGateway::shared();
        let cache = VolumeCache::new(gateway);

        cache.set_volume(150);
        assert_eq!(cache.current_volume(), 100);
    }

    #[test]
    fn refresh_overrides_optimistic_value() {
        let gateway = FakeGateway::shared();
        *gateway.volume.lock() = 0.4;
        gateway.fail_writes.store(true, Ordering::SeqCst);
        let cache = VolumeCache::new(gateway.clone());

        // Optimistic write shows instantly while the OS keeps the old level
        cache.set_volume(75);
        assert_eq!(cache.current_volume(), 75);

        cache.refresh_from_system();
        assert_eq!(cache.current_volume(), 40);
    }

    #[test]
    fn failed_refresh_invalidates_cache_and_next_read_retries() {
        let gateway = FakeGateway::shared();
        *gateway.volume.lock() = 0.6;
        *gateway.muted.lock() = true;
        let cache = VolumeCache::new(gateway.clone());

        cache.refresh_from_system();
        assert_eq!(cache.state().volume_percent, Some(60));
        assert_eq!(cache.state().muted, Some(true));

        gateway.no_device.store(true, Ordering::SeqCst);
        cache.refresh_from_system();
        let state = cache.state();
        assert_eq!(state.volume_percent, None);
        assert_eq!(state.muted, None);
        assert!(!state.endpoint_valid);

        // Every read attempts a fresh refresh instead of serving stale data
        let before = gateway.resolve_calls.load(Ordering::SeqCst);
        assert_eq!(cache.current_volume(), 0);
        assert!(!cache.is_muted());
        assert_eq!(gateway.resolve_calls.load(Ordering::SeqCst), before + 2);
    }

    #[test]
    fn mute_is_write_through() {
        let gateway = FakeGateway::shared();
        gateway.fail_writes.store(true, Ordering::SeqCst);
        let cache = VolumeCache::new(gateway);

        cache.set_muted(true);
        assert!(cache.is_muted());
    }
}
