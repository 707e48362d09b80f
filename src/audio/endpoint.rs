//! Default render endpoint access using the Windows Core Audio API
//!
//! The gateway is stateless: every `resolve_endpoint` call re-queries the
//! system default render device so the caller never writes through a handle
//! belonging to an unplugged device. Caching is the caller's job.

use crate::error::Result;

/// Narrow capability interface over the platform volume endpoint
///
/// All operations on a handle may fail at any time (device hot-swap); callers
/// are expected to degrade to their cached values rather than surface errors.
pub trait EndpointGateway {
    /// Opaque capability for the resolved endpoint's volume interface
    type Handle: Clone;

    /// Resolve the current default render endpoint, always fresh
    fn resolve_endpoint(&self) -> Result<Self::Handle>;

    /// Master volume as a scalar in 0.0..=1.0
    fn volume(&self, handle: &Self::Handle) -> Result<f32>;

    /// Set master volume; out-of-range input is clamped, not rejected
    fn set_volume(&self, handle: &Self::Handle, level: f32) -> Result<()>;

    /// Current mute state
    fn mute(&self, handle: &Self::Handle) -> Result<bool>;

    /// Set mute state
    fn set_mute(&self, handle: &Self::Handle, mute: bool) -> Result<()>;
}

#[cfg(windows)]
pub use windows_impl::{EndpointHandle, SystemEndpointGateway};

#[cfg(windows)]
mod windows_impl {
    use super::EndpointGateway;
    use crate::error::{MinivolError, Result};
    use tracing::debug;
    use windows::Win32::{
        Media::Audio::Endpoints::IAudioEndpointVolume,
        Media::Audio::{eMultimedia, eRender, IMMDeviceEnumerator, MMDeviceEnumerator},
        System::Com::{CoCreateInstance, CoInitializeEx, CLSCTX_ALL, COINIT_MULTITHREADED},
    };
    use windows_core::GUID;

    /// Volume interface of one resolved default render device
    ///
    /// Never reused across refreshes; a stale handle must not be written to
    /// after the default device changes.
    #[derive(Clone)]
    pub struct EndpointHandle {
        volume: IAudioEndpointVolume,
    }

    // SAFETY: the COM interface is activated on a thread initialized with
    // COINIT_MULTITHREADED and is safe to use from any thread
    unsafe impl Send for EndpointHandle {}

    /// Core Audio implementation of the endpoint gateway
    pub struct SystemEndpointGateway {
        enumerator: IMMDeviceEnumerator,
    }

    // SAFETY: see EndpointHandle
    unsafe impl Send for SystemEndpointGateway {}

    impl SystemEndpointGateway {
        /// Create a gateway, initializing COM for this thread if needed
        pub fn new() -> Result<Self> {
            unsafe {
                // Ignore the error if COM is already initialized
                let _ = CoInitializeEx(None, COINIT_MULTITHREADED);

                let enumerator: IMMDeviceEnumerator =
                    CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)
                        .map_err(|e| MinivolError::NoDevice(e.to_string()))?;

                debug!("endpoint gateway initialized");
                Ok(Self { enumerator })
            }
        }
    }

    impl EndpointGateway for SystemEndpointGateway {
        type Handle = EndpointHandle;

        fn resolve_endpoint(&self) -> Result<EndpointHandle> {
            unsafe {
                let device = self
                    .enumerator
                    .GetDefaultAudioEndpoint(eRender, eMultimedia)
                    .map_err(|e| MinivolError::NoDevice(e.to_string()))?;

                let volume: IAudioEndpointVolume = device
                    .Activate(CLSCTX_ALL, None)
                    .map_err(|e| MinivolError::NoDevice(e.to_string()))?;

                Ok(EndpointHandle { volume })
            }
        }

        fn volume(&self, handle: &EndpointHandle) -> Result<f32> {
            unsafe {
                handle
                    .volume
                    .GetMasterVolumeLevelScalar()
                    .map_err(|e| MinivolError::Query(e.to_string()))
            }
        }

        fn set_volume(&self, handle: &EndpointHandle, level: f32) -> Result<()> {
            let clamped = level.clamp(0.0, 1.0);
            let ctx = GUID::zeroed();
            unsafe {
                handle
                    .volume
                    .SetMasterVolumeLevelScalar(clamped, &ctx)
                    .map_err(|e| MinivolError::Write(e.to_string()))
            }
        }

        fn mute(&self, handle: &EndpointHandle) -> Result<bool> {
            unsafe {
                handle
                    .volume
                    .GetMute()
                    .map(|m| m.as_bool())
                    .map_err(|e| MinivolError::Query(e.to_string()))
            }
        }

        fn set_mute(&self, handle: &EndpointHandle, mute: bool) -> Result<()> {
            let ctx = GUID::zeroed();
            unsafe {
                handle
                    .volume
                    .SetMute(mute, &ctx)
                    .map_err(|e| MinivolError::Write(e.to_string()))
            }
        }
    }
}
