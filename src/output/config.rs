// Static tuning for a ramped output

use serde::{Deserialize, Serialize};

use super::error::{OutputError, Result};

/// Tuning parameters fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output polarity, applied to the device once
    #[serde(default)]
    pub inverted: bool,
    /// Scale applied to every normalized command before it reaches the device
    pub multiplier: f64,
    /// Max per-tick change while speeding up or changing direction
    pub accel_up: f64,
    /// Max per-tick change while slowing down in the same direction
    pub accel_down: f64,
}

impl OutputConfig {
    pub fn new(inverted: bool, multiplier: f64, accel_up: f64, accel_down: f64) -> Self {
        Self {
            inverted,
            multiplier,
            accel_up,
            accel_down,
        }
    }

    /// Same rate for both directions
    pub fn symmetric(inverted: bool, multiplier: f64, accel: f64) -> Self {
        Self::new(inverted, multiplier, accel, accel)
    }

    /// No ramping; only `set` moves the output
    pub fn unramped(inverted: bool, multiplier: f64) -> Self {
        Self::symmetric(inverted, multiplier, 0.0)
    }

    /// Reject values that would make the ramp undefined
    pub fn validate(&self) -> Result<()> {
        if !self.multiplier.is_finite() || self.multiplier == 0.0 {
            return Err(OutputError::invalid(format!(
                "multiplier must be finite and nonzero, got {}",
                self.multiplier
            )));
        }

        for (name, rate) in [("accel_up", self.accel_up), ("accel_down", self.accel_down)] {
            // NaN fails this check too
            if !(rate >= 0.0 && rate.is_finite()) {
                return Err(OutputError::invalid(format!(
                    "{} must be finite and nonnegative, got {}",
                    name, rate
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_and_unramped() {
        let cfg = OutputConfig::symmetric(true, 0.5, 0.1);
        assert_eq!(cfg.accel_up, 0.1);
        assert_eq!(cfg.accel_down, 0.1);
        assert!(cfg.inverted);

        let cfg = OutputConfig::unramped(false, 1.0);
        assert_eq!(cfg.accel_up, 0.0);
        assert_eq!(cfg.accel_down, 0.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_multiplier() {
        let err = OutputConfig::symmetric(false, 0.0, 0.1).validate().unwrap_err();
        assert!(matches!(err, OutputError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_rejects_bad_rates() {
        assert!(OutputConfig::new(false, 1.0, -0.1, 0.1).validate().is_err());
        assert!(OutputConfig::new(false, 1.0, 0.1, f64::NAN).validate().is_err());
        assert!(OutputConfig::new(false, f64::INFINITY, 0.1, 0.1).validate().is_err());
    }

    #[test]
    fn test_negative_multiplier_allowed() {
        assert!(OutputConfig::symmetric(false, -0.8, 0.1).validate().is_ok());
    }

    #[test]
    fn test_deserialize_defaults_inverted() {
        let cfg: OutputConfig =
            serde_json::from_str(r#"{"multiplier": 0.5, "accel_up": 0.1, "accel_down": 0.2}"#)
                .unwrap();
        assert!(!cfg.inverted);
        assert_eq!(cfg, OutputConfig::new(false, 0.5, 0.1, 0.2));
    }
}
