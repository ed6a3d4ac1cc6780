// Follow strategies: how a follower device gets bound to its leader

use super::device::Follower;
use super::error::FollowError;

/// Binds a follower device so it mirrors the leader's raw output.
///
/// Any `Fn(&D, &mut D) -> Result<(), FollowError>` closure is a strategy.
pub trait FollowStrategy<D> {
    fn follow(&self, leader: &D, follower: &mut D) -> Result<(), FollowError>;
}

impl<D, F> FollowStrategy<D> for F
where
    F: Fn(&D, &mut D) -> Result<(), FollowError>,
{
    fn follow(&self, leader: &D, follower: &mut D) -> Result<(), FollowError> {
        self(leader, follower)
    }
}

/// Uses whatever follow mechanism the follower device declares
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFollow;

impl<D: Follower> FollowStrategy<D> for NativeFollow {
    fn follow(&self, leader: &D, follower: &mut D) -> Result<(), FollowError> {
        follower.follow(leader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::testing::TestDevice;

    #[test]
    fn test_closure_strategy() {
        let leader = TestDevice::with_id(1);
        let mut follower = TestDevice::with_id(2);

        let strategy = |leader: &TestDevice, follower: &mut TestDevice| -> Result<(), FollowError> {
            follower.following = Some(leader.id);
            Ok(())
        };
        strategy.follow(&leader, &mut follower).unwrap();
        assert_eq!(follower.following, Some(1));
    }

    #[test]
    fn test_native_follow_uses_device_binding() {
        let leader = TestDevice::with_id(4);
        let mut follower = TestDevice::with_id(5);
        NativeFollow.follow(&leader, &mut follower).unwrap();
        assert_eq!(follower.following, Some(4));
    }

    #[test]
    fn test_native_follow_reports_unsupported() {
        let leader = TestDevice::with_id(4);
        let mut follower = TestDevice::with_id(4);
        let err = NativeFollow.follow(&leader, &mut follower).unwrap_err();
        assert!(matches!(err, FollowError::Unsupported(_)));
    }
}
