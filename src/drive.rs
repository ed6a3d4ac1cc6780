// Tank drive built from two output groups
//
// Combines arcade mixing with one ramped output group per side.

use tracing::{info, warn};

use crate::config::{DriveConfig, LEFT_FIRST_ID, RIGHT_FIRST_ID};
use crate::messages::{DriveCommand, DriveSample, RuntimeHealth};
use crate::output::{OutputDevice, OutputError, OutputGroup};
use crate::sim::{self, AnyOutput, SimBus};

/// Normalized velocity per side
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SideVelocities {
    pub left: f64,
    pub right: f64,
}

impl SideVelocities {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

/// Mix forward/turn commands into side velocities.
///
/// If either side would exceed 1.0, both are scaled down together so the
/// turn ratio is kept.
pub fn arcade_to_tank(forward: f64, turn: f64) -> SideVelocities {
    let mut left = forward + turn;
    let mut right = forward - turn;

    let max = left.abs().max(right.abs());
    if max > 1.0 {
        left /= max;
        right /= max;
    }

    SideVelocities { left, right }
}

/// Two-sided drive train, one output group per side
pub struct TankDrive<D: OutputDevice> {
    left: OutputGroup<D>,
    right: OutputGroup<D>,
}

impl<D: OutputDevice> TankDrive<D> {
    pub fn new(left: OutputGroup<D>, right: OutputGroup<D>) -> Self {
        Self { left, right }
    }

    /// Ramp both sides one tick toward the mixed command
    pub fn arcade(&mut self, cmd: DriveCommand) -> Result<SideVelocities, OutputError> {
        let target = arcade_to_tank(cmd.forward, cmd.turn);
        self.tank(target)
    }

    /// Ramp both sides one tick toward explicit side velocities
    pub fn tank(&mut self, target: SideVelocities) -> Result<SideVelocities, OutputError> {
        Ok(SideVelocities {
            left: self.left.accel_to(target.left)?,
            right: self.right.accel_to(target.right)?,
        })
    }

    /// Jump both sides to the mixed command without ramping
    pub fn set(&mut self, cmd: DriveCommand) -> Result<(), OutputError> {
        let target = arcade_to_tank(cmd.forward, cmd.turn);
        self.left.set(target.left)?;
        self.right.set(target.right)
    }

    /// Stop both sides immediately
    pub fn stop(&mut self) -> Result<(), OutputError> {
        self.left.set(0.0)?;
        self.right.set(0.0)
    }

    /// Toggle both sides on/off in raw units
    pub fn toggle(&mut self) -> Result<(), OutputError> {
        self.left.toggle()?;
        self.right.toggle()
    }

    pub fn velocities(&self) -> SideVelocities {
        SideVelocities::new(self.left.velocity(), self.right.velocity())
    }

    pub fn left(&self) -> &OutputGroup<D> {
        &self.left
    }

    pub fn right(&self) -> &OutputGroup<D> {
        &self.right
    }
}

impl TankDrive<AnyOutput> {
    /// Build a drive on simulated devices; bus sides share one bus
    pub fn simulated(config: &DriveConfig) -> Result<Self, OutputError> {
        let bus = SimBus::new();
        let left = sim::build_group(&config.left, &bus, LEFT_FIRST_ID)?;
        let right = sim::build_group(&config.right, &bus, RIGHT_FIRST_ID)?;
        info!(
            "Simulated drive ready: left={} x{}, right={} x{}",
            config.left.family,
            config.left.followers + 1,
            config.right.family,
            config.right.followers + 1
        );
        Ok(Self::new(left, right))
    }

    pub fn sample(&self, tick: u64, health: RuntimeHealth) -> DriveSample {
        let velocities = self.velocities();
        DriveSample {
            tick,
            health,
            left: velocities.left,
            right: velocities.right,
            left_applied: self.left.devices().map(AnyOutput::applied).collect(),
            right_applied: self.right.devices().map(AnyOutput::applied).collect(),
        }
    }
}

impl<D: OutputDevice> Drop for TankDrive<D> {
    fn drop(&mut self) {
        // Try to stop motors when the drive is dropped (safety measure)
        if let Err(e) = self.stop() {
            warn!("Failed to stop drive on drop: {}", e);
        }
    }
}
