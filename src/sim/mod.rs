// Simulated output devices
//
// Two device families with different follow mechanisms:
// - MirrorOutput: controller-level "follow that device" mode
// - BusOutput: bus-level sync-write groups on a shared SimBus

mod bus;
mod mirror;

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::config::SideConfig;
use crate::output::{FollowError, Follower, OutputDevice, OutputError, OutputGroup};

pub use bus::{BusError, BusOutput, SimBus};
pub use mirror::MirrorOutput;

/// Which simulated device family a group is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceFamily {
    #[default]
    Mirror,
    Bus,
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceFamily::Mirror => write!(f, "mirror"),
            DeviceFamily::Bus => write!(f, "bus"),
        }
    }
}

/// Any simulated device, so mixed families can share one group type
#[derive(Debug, Clone)]
pub enum AnyOutput {
    Mirror(MirrorOutput),
    Bus(BusOutput),
}

impl AnyOutput {
    pub fn family(&self) -> DeviceFamily {
        match self {
            AnyOutput::Mirror(_) => DeviceFamily::Mirror,
            AnyOutput::Bus(_) => DeviceFamily::Bus,
        }
    }

    /// Physical output after polarity
    pub fn applied(&self) -> f64 {
        match self {
            AnyOutput::Mirror(m) => m.applied(),
            AnyOutput::Bus(b) => b.applied(),
        }
    }
}

impl OutputDevice for AnyOutput {
    type Error = BusError;

    fn write(&mut self, value: f64) -> Result<(), BusError> {
        match self {
            AnyOutput::Mirror(m) => m.write(value).map_err(|never| match never {}),
            AnyOutput::Bus(b) => b.write(value),
        }
    }

    fn read(&self) -> f64 {
        match self {
            AnyOutput::Mirror(m) => m.read(),
            AnyOutput::Bus(b) => b.read(),
        }
    }

    fn set_inverted(&mut self, inverted: bool) -> Result<(), BusError> {
        match self {
            AnyOutput::Mirror(m) => m.set_inverted(inverted).map_err(|never| match never {}),
            AnyOutput::Bus(b) => b.set_inverted(inverted),
        }
    }
}

impl Follower for AnyOutput {
    fn follow(&mut self, leader: &Self) -> Result<(), FollowError> {
        match (self, leader) {
            (AnyOutput::Mirror(f), AnyOutput::Mirror(l)) => f.follow(l),
            (AnyOutput::Bus(f), AnyOutput::Bus(l)) => f.follow(l),
            (f, l) => Err(FollowError::unsupported(format!(
                "{} device cannot follow a {} leader",
                f.family(),
                l.family()
            ))),
        }
    }
}

impl From<MirrorOutput> for AnyOutput {
    fn from(m: MirrorOutput) -> Self {
        AnyOutput::Mirror(m)
    }
}

impl From<BusOutput> for AnyOutput {
    fn from(b: BusOutput) -> Self {
        AnyOutput::Bus(b)
    }
}

/// Build one side's group of simulated devices.
///
/// Bus devices take consecutive ids starting at `first_id`.
pub fn build_group(
    side: &SideConfig,
    bus: &Rc<SimBus>,
    first_id: u8,
) -> Result<OutputGroup<AnyOutput>, OutputError> {
    let count = side.followers + 1;
    let mut devices = Vec::with_capacity(count);

    for offset in 0..count {
        let device = match side.family {
            DeviceFamily::Mirror => AnyOutput::from(MirrorOutput::new()),
            DeviceFamily::Bus => {
                let id = u8::try_from(offset)
                    .ok()
                    .and_then(|offset| first_id.checked_add(offset))
                    .ok_or_else(|| {
                        OutputError::InvalidConfiguration(format!(
                            "too many bus devices starting at id {}",
                            first_id
                        ))
                    })?;
                AnyOutput::from(BusOutput::attach(bus, id).map_err(OutputError::device)?)
            }
        };
        devices.push(device);
    }

    OutputGroup::with_native_follow(&side.output, devices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputConfig;

    fn side(family: DeviceFamily, followers: usize) -> SideConfig {
        SideConfig {
            output: OutputConfig::new(true, 0.5, 0.25, 0.5),
            followers,
            family,
        }
    }

    #[test]
    fn test_mixed_families_unsupported() {
        let bus = SimBus::new();
        let devices = vec![
            AnyOutput::from(MirrorOutput::new()),
            AnyOutput::from(BusOutput::attach(&bus, 1).unwrap()),
        ];
        let cfg = OutputConfig::symmetric(false, 1.0, 0.1);
        let err = OutputGroup::with_native_follow(&cfg, devices).unwrap_err();
        match err {
            OutputError::UnsupportedFollowerDevice { index, reason } => {
                assert_eq!(index, 1);
                assert!(reason.contains("bus device cannot follow a mirror leader"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_build_bus_group() {
        let bus = SimBus::new();
        let mut group = build_group(&side(DeviceFamily::Bus, 2), &bus, 10).unwrap();
        group.accel_to(1.0).unwrap();

        for id in 10..=12 {
            assert_eq!(bus.goal(id), Some(0.125));
        }
        assert!(group.devices().all(|d| d.applied() == -0.125));
        assert_eq!(bus.frames_sent(), 1);
    }

    #[test]
    fn test_build_mirror_group() {
        let bus = SimBus::new();
        let mut group = build_group(&side(DeviceFamily::Mirror, 1), &bus, 0).unwrap();
        group.set(1.0).unwrap();

        let applied: Vec<f64> = group.devices().map(AnyOutput::applied).collect();
        assert_eq!(applied, vec![-0.5, -0.5]);
        assert_eq!(bus.frames_sent(), 0);
    }

    #[test]
    fn test_build_group_id_overflow() {
        let bus = SimBus::new();
        let err = build_group(&side(DeviceFamily::Bus, 3), &bus, 254).unwrap_err();
        assert!(matches!(err, OutputError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_failed_group_keeps_earlier_bindings() {
        let bus = SimBus::new();
        let mut leader = BusOutput::attach(&bus, 1).unwrap();
        let devices = vec![
            leader.clone(),
            BusOutput::attach(&bus, 2).unwrap(),
            BusOutput::attach(&SimBus::new(), 3).unwrap(),
        ];
        let cfg = OutputConfig::symmetric(false, 1.0, 0.1);
        let err = OutputGroup::with_native_follow(&cfg, devices).unwrap_err();
        assert!(matches!(
            err,
            OutputError::UnsupportedFollowerDevice { index: 2, .. }
        ));

        // Device 2 is still in the leader's sync group and both ids stay taken
        leader.write(0.4).unwrap();
        assert_eq!(bus.goal(2), Some(0.4));
        assert!(matches!(
            BusOutput::attach(&bus, 1),
            Err(BusError::DuplicateId { id: 1 })
        ));

        // A fresh bus builds the same layout
        let retry = build_group(&side(DeviceFamily::Bus, 1), &SimBus::new(), 1).unwrap();
        let ids: Vec<u8> = retry
            .devices()
            .map(|d| match d {
                AnyOutput::Bus(b) => b.id(),
                AnyOutput::Mirror(_) => unreachable!(),
            })
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
