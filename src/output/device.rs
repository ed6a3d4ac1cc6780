// Minimal capability a motor-output device has to provide

use super::error::FollowError;

/// A single motor-output endpoint.
///
/// `read` returns the last commanded raw output, not measured feedback.
/// Raw output is conventionally in `[-1.0, 1.0]`; what happens outside that
/// range is up to the device.
pub trait OutputDevice {
    /// Device-level failure (bus timeout, driver fault, ...)
    type Error: std::error::Error + Send + Sync + 'static;

    /// Command a raw output value
    fn write(&mut self, value: f64) -> Result<(), Self::Error>;

    /// Last commanded raw output
    fn read(&self) -> f64;

    /// Configure output polarity
    fn set_inverted(&mut self, inverted: bool) -> Result<(), Self::Error>;
}

/// A device that knows how to mirror another device of its kind.
///
/// Each device family implements its own binding (native follow mode,
/// bus-level sync groups, ...). A device that cannot follow the given leader
/// returns `FollowError::Unsupported`.
pub trait Follower: OutputDevice {
    fn follow(&mut self, leader: &Self) -> Result<(), FollowError>;
}
