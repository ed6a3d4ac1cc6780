// Error types for ramped outputs and output groups

use std::error::Error;

/// Boxed device-level error, carried unchanged from the device implementation
pub type DeviceError = Box<dyn Error + Send + Sync + 'static>;

/// Errors raised while building or driving an output
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Follower {index} cannot follow the leader: {reason}")]
    UnsupportedFollowerDevice { index: usize, reason: String },

    #[error("Device error: {0}")]
    Device(#[source] DeviceError),
}

impl OutputError {
    /// Wrap a device's own error type
    pub fn device<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        OutputError::Device(Box::new(err))
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        OutputError::InvalidConfiguration(reason.into())
    }
}

/// Errors returned by a follow strategy while binding one follower
#[derive(Debug, thiserror::Error)]
pub enum FollowError {
    #[error("{0}")]
    Unsupported(String),

    #[error("Device error: {0}")]
    Device(#[source] DeviceError),
}

impl FollowError {
    pub fn unsupported(reason: impl Into<String>) -> Self {
        FollowError::Unsupported(reason.into())
    }

    pub fn device<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        FollowError::Device(Box::new(err))
    }

    /// Attach the follower's position in the group
    pub(crate) fn at_follower(self, index: usize) -> OutputError {
        match self {
            FollowError::Unsupported(reason) => {
                OutputError::UnsupportedFollowerDevice { index, reason }
            }
            FollowError::Device(err) => OutputError::Device(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, OutputError>;
