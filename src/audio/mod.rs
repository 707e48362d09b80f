//! Audio endpoint access and cached volume/mute state

pub mod cache;
pub mod endpoint;

pub use cache::{VolumeCache, VolumeState};
pub use endpoint::EndpointGateway;
#[cfg(windows)]
pub use endpoint::{EndpointHandle, SystemEndpointGateway};
