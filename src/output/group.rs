// Leader/follower output group
//
// Only the leader is ever commanded. Followers are configured once at
// construction and are expected to mirror the leader through whatever binding
// the follow strategy set up.

use tracing::{debug, info};

use super::config::OutputConfig;
use super::device::{Follower, OutputDevice};
use super::follow::{FollowStrategy, NativeFollow};
use super::ramped::RampedOutput;
use super::error::{OutputError, Result};

/// Mechanically ganged motors driven as one ramped output
#[derive(Debug)]
pub struct OutputGroup<D: OutputDevice> {
    leader: RampedOutput<D>,
    followers: Vec<D>,
}

impl<D: OutputDevice> OutputGroup<D> {
    /// Build a group from an ordered device list; the first device leads.
    ///
    /// Each follower gets the group's polarity before it is bound. Errors name
    /// the follower by its position in `devices`.
    ///
    /// On error the devices are consumed and nothing is undone: followers
    /// bound before the failing one stay bound to the leader, and any ids the
    /// devices hold on a shared bus stay registered. Retry with fresh devices.
    pub fn new<S, I>(config: &OutputConfig, strategy: &S, devices: I) -> Result<Self>
    where
        S: FollowStrategy<D> + ?Sized,
        I: IntoIterator<Item = D>,
    {
        let mut devices = devices.into_iter();
        let leader = devices
            .next()
            .ok_or_else(|| OutputError::invalid("output group needs at least one device"))?;
        let leader = RampedOutput::new(config, leader)?;

        let mut followers = Vec::new();
        for (index, mut follower) in (1..).zip(devices) {
            follower
                .set_inverted(config.inverted)
                .map_err(OutputError::device)?;
            strategy
                .follow(leader.device(), &mut follower)
                .map_err(|e| e.at_follower(index))?;
            debug!("Follower {} bound to group leader", index);
            followers.push(follower);
        }

        info!(
            "Output group ready: {} follower(s), multiplier={}",
            followers.len(),
            config.multiplier
        );
        Ok(Self { leader, followers })
    }

    /// Ramp the leader one tick toward `target`
    pub fn accel_to(&mut self, target: f64) -> Result<f64> {
        self.leader.accel_to(target)
    }

    /// Set the leader immediately
    pub fn set(&mut self, velocity: f64) -> Result<()> {
        self.leader.set(velocity)
    }

    /// Toggle the leader between raw 0.0 and 1.0
    pub fn toggle(&mut self) -> Result<()> {
        self.leader.toggle()
    }

    pub fn velocity(&self) -> f64 {
        self.leader.velocity()
    }

    pub fn leader(&self) -> &RampedOutput<D> {
        &self.leader
    }

    pub fn followers(&self) -> &[D] {
        &self.followers
    }

    /// All members in construction order, leader first
    pub fn devices(&self) -> impl Iterator<Item = &D> {
        std::iter::once(self.leader.device()).chain(self.followers.iter())
    }
}

impl<D: Follower> OutputGroup<D> {
    /// Build a group where each follower binds through its own follow capability
    pub fn with_native_follow<I>(config: &OutputConfig, devices: I) -> Result<Self>
    where
        I: IntoIterator<Item = D>,
    {
        Self::new(config, &NativeFollow, devices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::output::error::FollowError;
    use crate::output::testing::TestDevice;
    use crate::sim::MirrorOutput;

    fn config() -> OutputConfig {
        OutputConfig::new(true, 0.5, 0.25, 0.5)
    }

    #[test]
    fn test_empty_group_rejected() {
        let err = OutputGroup::<TestDevice>::with_native_follow(&config(), Vec::new()).unwrap_err();
        assert!(matches!(err, OutputError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_single_device_matches_bare_output() {
        let calls = RefCell::new(0);
        let strategy = |_: &TestDevice, _: &mut TestDevice| -> std::result::Result<(), FollowError> {
            *calls.borrow_mut() += 1;
            Ok(())
        };
        let mut group = OutputGroup::new(&config(), &strategy, [TestDevice::with_id(1)]).unwrap();
        let mut bare = RampedOutput::new(&config(), TestDevice::with_id(1)).unwrap();

        assert_eq!(*calls.borrow(), 0);
        assert!(group.followers().is_empty());

        for target in [1.0, 1.0, -0.5, 0.0, 0.0] {
            assert_eq!(group.accel_to(target).unwrap(), bare.accel_to(target).unwrap());
        }
        group.set(0.75).unwrap();
        bare.set(0.75).unwrap();
        assert_eq!(group.leader().device().writes, bare.device().writes);
        assert_eq!(group.leader().device().inverted, bare.device().inverted);
    }

    #[test]
    fn test_followers_inverted_then_bound_in_order() {
        let bound = RefCell::new(Vec::new());
        let strategy = |leader: &TestDevice, follower: &mut TestDevice| -> std::result::Result<(), FollowError> {
            assert!(follower.inverted, "inversion must be applied before binding");
            bound.borrow_mut().push((leader.id, follower.id));
            follower.following = Some(leader.id);
            Ok(())
        };

        let devices = (1..=3).map(TestDevice::with_id);
        let group = OutputGroup::new(&config(), &strategy, devices).unwrap();

        assert_eq!(*bound.borrow(), vec![(1, 2), (1, 3)]);
        assert!(group.leader().device().inverted);
        assert_eq!(group.devices().map(|d| d.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_unsupported_follower_names_index() {
        // TestDevice refuses to follow a device with its own id
        let devices = [TestDevice::with_id(1), TestDevice::with_id(2), TestDevice::with_id(1)];
        let err = OutputGroup::with_native_follow(&config(), devices).unwrap_err();
        match err {
            OutputError::UnsupportedFollowerDevice { index, .. } => assert_eq!(index, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_only_leader_is_written() {
        let devices = (1..=3).map(TestDevice::with_id);
        let mut group = OutputGroup::with_native_follow(&config(), devices).unwrap();

        group.accel_to(1.0).unwrap();
        group.set(0.2).unwrap();
        group.toggle().unwrap();

        assert_eq!(group.leader().device().writes.len(), 3);
        assert!(group.followers().iter().all(|f| f.writes.is_empty()));
    }

    #[test]
    fn test_followers_mirror_leader() {
        let motors: Vec<MirrorOutput> = (0..3).map(|_| MirrorOutput::new()).collect();
        let probes = motors.clone();
        let mut group = OutputGroup::with_native_follow(&config(), motors).unwrap();

        group.accel_to(1.0).unwrap();
        group.accel_to(1.0).unwrap();

        for probe in &probes {
            assert_eq!(probe.read(), 0.25);
            assert_eq!(probe.applied(), -0.25);
        }
    }
}
