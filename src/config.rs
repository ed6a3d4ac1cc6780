// Loop timing, tuning defaults and drive configuration
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::output::{OutputConfig, OutputError};
use crate::sim::DeviceFamily;

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;

// Command timeout for watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

// Default tuning (normalized units per tick at LOOP_HZ)
pub const DEFAULT_MULTIPLIER: f64 = 0.8;
pub const DEFAULT_ACCEL_UP: f64 = 0.02;
pub const DEFAULT_ACCEL_DOWN: f64 = 0.05;

// First bus id for each side when using bus devices
pub const LEFT_FIRST_ID: u8 = 1;
pub const RIGHT_FIRST_ID: u8 = 11;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid {side} side: {source}")]
    Invalid {
        side: &'static str,
        #[source]
        source: OutputError,
    },
}

/// One side of the drive train: tuning plus how many motors it gangs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SideConfig {
    #[serde(flatten)]
    pub output: OutputConfig,
    #[serde(default)]
    pub followers: usize,
    #[serde(default)]
    pub family: DeviceFamily,
}

impl SideConfig {
    fn default_with(inverted: bool) -> Self {
        Self {
            output: OutputConfig::new(
                inverted,
                DEFAULT_MULTIPLIER,
                DEFAULT_ACCEL_UP,
                DEFAULT_ACCEL_DOWN,
            ),
            followers: 1,
            family: DeviceFamily::Mirror,
        }
    }
}

/// Tank drive configuration, loaded from JSON
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriveConfig {
    pub left: SideConfig,
    pub right: SideConfig,
}

impl Default for DriveConfig {
    // Right side motors face the other way
    fn default() -> Self {
        Self {
            left: SideConfig::default_with(false),
            right: SideConfig::default_with(true),
        }
    }
}

impl DriveConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (side, cfg) in [("left", &self.left), ("right", &self.right)] {
            cfg.output
                .validate()
                .map_err(|source| ConfigError::Invalid { side, source })?;
        }
        Ok(())
    }
}
