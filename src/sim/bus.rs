// Simulated serial motor bus with sync-write groups
//
// Devices share one bus and are addressed by id. Following is a bus-level
// relationship: the follower's id joins the leader's sync group, and every
// goal written to the leader goes out as one sync-write frame covering the
// whole group.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::debug;

use crate::output::{FollowError, Follower, OutputDevice};

/// Error types for simulated bus communication
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Id {id} is already attached to the bus")]
    DuplicateId { id: u8 },

    #[error("Timeout waiting for response from device {id}")]
    NoResponse { id: u8 },
}

#[derive(Debug, Default, Clone, Copy)]
struct Register {
    goal: f64,
    inverted: bool,
    fault: bool,
}

/// Shared bus all `BusOutput`s on it talk through
#[derive(Debug, Default)]
pub struct SimBus {
    registers: RefCell<BTreeMap<u8, Register>>,
    sync_groups: RefCell<BTreeMap<u8, Vec<u8>>>,
    frames: Cell<u64>,
}

impl SimBus {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Make a device stop answering (or answer again)
    pub fn set_fault(&self, id: u8, fault: bool) {
        if let Some(reg) = self.registers.borrow_mut().get_mut(&id) {
            reg.fault = fault;
        }
    }

    /// Current goal register of a device
    pub fn goal(&self, id: u8) -> Option<f64> {
        self.registers.borrow().get(&id).map(|reg| reg.goal)
    }

    /// Number of frames written so far
    pub fn frames_sent(&self) -> u64 {
        self.frames.get()
    }

    fn attach(&self, id: u8) -> Result<(), BusError> {
        let mut registers = self.registers.borrow_mut();
        if registers.contains_key(&id) {
            return Err(BusError::DuplicateId { id });
        }
        registers.insert(id, Register::default());
        Ok(())
    }

    fn check(&self, id: u8) -> Result<(), BusError> {
        match self.registers.borrow().get(&id) {
            Some(reg) if !reg.fault => Ok(()),
            _ => Err(BusError::NoResponse { id }),
        }
    }

    fn write_goal(&self, id: u8, value: f64) -> Result<(), BusError> {
        self.check(id)?;

        let mut targets = vec![id];
        if let Some(group) = self.sync_groups.borrow().get(&id) {
            targets.extend_from_slice(group);
        }

        // Sync write has no response, so only the addressed device is checked
        let mut registers = self.registers.borrow_mut();
        for target in &targets {
            if let Some(reg) = registers.get_mut(target) {
                reg.goal = value;
            }
        }
        self.frames.set(self.frames.get() + 1);

        if targets.len() > 1 {
            debug!("Sync write to {} devices: value={}", targets.len(), value);
        }
        Ok(())
    }

    fn set_inverted(&self, id: u8, inverted: bool) -> Result<(), BusError> {
        self.check(id)?;
        if let Some(reg) = self.registers.borrow_mut().get_mut(&id) {
            reg.inverted = inverted;
        }
        Ok(())
    }

    fn applied(&self, id: u8) -> f64 {
        match self.registers.borrow().get(&id) {
            Some(reg) if reg.inverted => -reg.goal,
            Some(reg) => reg.goal,
            None => 0.0,
        }
    }

    fn join_sync_group(&self, leader: u8, follower: u8) -> Result<(), BusError> {
        self.check(follower)?;

        let mut groups = self.sync_groups.borrow_mut();
        for members in groups.values_mut() {
            members.retain(|&id| id != follower);
        }
        groups.entry(leader).or_default().push(follower);
        drop(groups);

        // Pick up the leader's current goal right away
        let goal = self.goal(leader).unwrap_or(0.0);
        if let Some(reg) = self.registers.borrow_mut().get_mut(&follower) {
            reg.goal = goal;
        }
        debug!("Device {} joined sync group of {}", follower, leader);
        Ok(())
    }
}

/// One device on a `SimBus`. Clones address the same device.
#[derive(Debug, Clone)]
pub struct BusOutput {
    bus: Rc<SimBus>,
    id: u8,
}

impl BusOutput {
    /// Attach a new device with the given id
    pub fn attach(bus: &Rc<SimBus>, id: u8) -> Result<Self, BusError> {
        bus.attach(id)?;
        Ok(Self {
            bus: Rc::clone(bus),
            id,
        })
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    /// Physical output after polarity
    pub fn applied(&self) -> f64 {
        self.bus.applied(self.id)
    }
}

impl OutputDevice for BusOutput {
    type Error = BusError;

    fn write(&mut self, value: f64) -> Result<(), BusError> {
        self.bus.write_goal(self.id, value)
    }

    fn read(&self) -> f64 {
        self.bus.goal(self.id).unwrap_or(0.0)
    }

    fn set_inverted(&mut self, inverted: bool) -> Result<(), BusError> {
        self.bus.set_inverted(self.id, inverted)
    }
}

impl Follower for BusOutput {
    fn follow(&mut self, leader: &Self) -> Result<(), FollowError> {
        if !Rc::ptr_eq(&self.bus, &leader.bus) {
            return Err(FollowError::unsupported(format!(
                "device {} is not on the same bus as leader {}",
                self.id, leader.id
            )));
        }
        if self.id == leader.id {
            return Err(FollowError::unsupported(format!(
                "device {} cannot follow itself",
                self.id
            )));
        }

        self.bus
            .join_sync_group(leader.id, self.id)
            .map_err(FollowError::device)
    }
}
