// Rate-limited velocity output for a single device
//
// The current velocity is never stored here: it is read back from the device
// (`device.read() / multiplier`). Anything else writing to the device breaks
// that derivation, so the device must only be driven through this type.

use super::config::OutputConfig;
use super::device::OutputDevice;
use super::error::{OutputError, Result};

/// A motor output with scale, polarity and asymmetric acceleration limits
#[derive(Debug)]
pub struct RampedOutput<D: OutputDevice> {
    multiplier: f64,
    accel_up: f64,
    accel_down: f64,
    device: D,
}

/// Sign with `sign(0) == 0`. NaN maps to 0 so a NaN target holds the output.
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

impl<D: OutputDevice> RampedOutput<D> {
    /// Validate the tuning and apply polarity to the device
    pub fn new(config: &OutputConfig, mut device: D) -> Result<Self> {
        config.validate()?;
        device
            .set_inverted(config.inverted)
            .map_err(OutputError::device)?;

        Ok(Self {
            multiplier: config.multiplier,
            accel_up: config.accel_up,
            accel_down: config.accel_down,
            device,
        })
    }

    /// Current normalized velocity, derived from the device's last output
    pub fn velocity(&self) -> f64 {
        self.device.read() / self.multiplier
    }

    /// Move one tick toward `target` and return the new normalized velocity.
    ///
    /// Speeding up or crossing zero uses `accel_up`; slowing down without a
    /// sign change uses `accel_down`. The step never passes `target`.
    pub fn accel_to(&mut self, target: f64) -> Result<f64> {
        let now = self.velocity();

        let dir = sign(target - now);
        if dir == 0.0 {
            return Ok(now);
        }

        let rate = if sign(now) == sign(target) && target.abs() < now.abs() {
            self.accel_down
        } else {
            self.accel_up
        };

        let stepped = now + dir * rate;
        let next = if dir < 0.0 {
            stepped.max(target)
        } else {
            stepped.min(target)
        };

        self.device
            .write(next * self.multiplier)
            .map_err(OutputError::device)?;
        Ok(next)
    }

    /// Jump straight to `velocity`, skipping the ramp (e-stop, open-loop tests)
    pub fn set(&mut self, velocity: f64) -> Result<()> {
        self.device
            .write(velocity * self.multiplier)
            .map_err(OutputError::device)
    }

    /// Flip between raw 0.0 and raw 1.0.
    ///
    /// Works in raw device units: the multiplier is not applied, and any
    /// output other than exactly 0.0 counts as "on".
    pub fn toggle(&mut self) -> Result<()> {
        let next = if self.device.read() == 0.0 { 1.0 } else { 0.0 };
        self.device.write(next).map_err(OutputError::device)
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn accel_up(&self) -> f64 {
        self.accel_up
    }

    pub fn accel_down(&self) -> f64 {
        self.accel_down
    }

    /// The wrapped device, for inspection. Do not write to it directly.
    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }
}
