// Simulated motor controller with a native follow mode
//
// Modeled on smart motor controllers that accept "follow device X": once
// bound, the follower outputs whatever its leader outputs until it is written
// to directly.

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use tracing::debug;

use crate::output::{FollowError, Follower, OutputDevice};

#[derive(Debug, Default)]
struct MirrorState {
    output: Cell<f64>,
    inverted: Cell<bool>,
    leader: RefCell<Option<Rc<MirrorState>>>,
}

impl MirrorState {
    fn output(&self) -> f64 {
        match self.leader.borrow().as_ref() {
            Some(leader) => leader.output(),
            None => self.output.get(),
        }
    }
}

/// Simulated controller. Clones are handles to the same physical device.
#[derive(Debug, Clone, Default)]
pub struct MirrorOutput {
    state: Rc<MirrorState>,
}

impl MirrorOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_following(&self) -> bool {
        self.state.leader.borrow().is_some()
    }

    pub fn is_inverted(&self) -> bool {
        self.state.inverted.get()
    }

    /// Physical output after polarity
    pub fn applied(&self) -> f64 {
        let raw = self.state.output();
        if self.state.inverted.get() { -raw } else { raw }
    }
}

impl OutputDevice for MirrorOutput {
    type Error = Infallible;

    fn write(&mut self, value: f64) -> Result<(), Infallible> {
        if self.state.leader.borrow_mut().take().is_some() {
            debug!("Direct write released follower mode");
        }
        self.state.output.set(value);
        Ok(())
    }

    fn read(&self) -> f64 {
        self.state.output()
    }

    fn set_inverted(&mut self, inverted: bool) -> Result<(), Infallible> {
        self.state.inverted.set(inverted);
        Ok(())
    }
}

impl Follower for MirrorOutput {
    fn follow(&mut self, leader: &Self) -> Result<(), FollowError> {
        // Walk the leader's chain so we never bind into a loop
        let mut cursor = Some(Rc::clone(&leader.state));
        while let Some(state) = cursor {
            if Rc::ptr_eq(&state, &self.state) {
                return Err(FollowError::unsupported(
                    "following this leader would form a cycle",
                ));
            }
            cursor = state.leader.borrow().clone();
        }

        *self.state.leader.borrow_mut() = Some(Rc::clone(&leader.state));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follower_reads_leader_output() {
        let mut leader = MirrorOutput::new();
        let mut follower = MirrorOutput::new();
        follower.follow(&leader).unwrap();

        leader.write(0.4).unwrap();
        assert!(follower.is_following());
        assert_eq!(follower.read(), 0.4);
    }

    #[test]
    fn test_applied_respects_polarity() {
        let mut leader = MirrorOutput::new();
        let mut follower = MirrorOutput::new();
        follower.set_inverted(true).unwrap();
        follower.follow(&leader).unwrap();
        assert!(follower.is_inverted());
        assert!(!leader.is_inverted());

        leader.write(0.5).unwrap();
        assert_eq!(leader.applied(), 0.5);
        assert_eq!(follower.applied(), -0.5);
    }

    #[test]
    fn test_direct_write_releases_follow() {
        let mut leader = MirrorOutput::new();
        let mut follower = MirrorOutput::new();
        follower.follow(&leader).unwrap();

        follower.write(-1.0).unwrap();
        leader.write(0.3).unwrap();
        assert!(!follower.is_following());
        assert_eq!(follower.read(), -1.0);
    }

    #[test]
    fn test_cycle_rejected() {
        let a = MirrorOutput::new();
        let mut b = MirrorOutput::new();
        b.follow(&a).unwrap();

        let mut a_handle = a.clone();
        assert!(matches!(a_handle.follow(&b), Err(FollowError::Unsupported(_))));

        let mut self_handle = a.clone();
        assert!(self_handle.follow(&a).is_err());
    }
}
