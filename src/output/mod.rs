// Ramped motor outputs and leader/follower output groups
//
// Provides:
// - Device capability traits (write/read/polarity, native follow)
// - Rate-limited single-device output with asymmetric acceleration
// - Output groups that fan a leader's output out to followers

mod config;
mod device;
mod error;
mod follow;
mod group;
mod ramped;

pub use config::OutputConfig;
pub use device::{Follower, OutputDevice};
pub use error::{DeviceError, FollowError, OutputError, Result};
pub use follow::{FollowStrategy, NativeFollow};
pub use group::OutputGroup;
pub use ramped::RampedOutput;
