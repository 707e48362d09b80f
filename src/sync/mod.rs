//! Shared timing and reconciliation policy

pub mod clock;

pub use clock::{Clock, ManualClock, SuppressionGate, SystemClock};
