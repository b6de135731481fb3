//! Capacity-limited zones.
//!
//! A `ZoneGate` counts the robots inside an area that can only hold a few at
//! once (a narrow aisle, a charging bay).  It is independent of the planner
//! and safe to share between threads.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::trace;

use wh_core::AgentId;

use crate::{FleetError, FleetResult};

type ZoneCallback = Box<dyn Fn(AgentId, usize) + Send + Sync>;

/// Bounded occupancy counter.  Callbacks receive the robot and the occupancy
/// after the change.
pub struct ZoneGate {
    capacity:  usize,
    occupancy: AtomicUsize,
    on_enter:  Option<ZoneCallback>,
    on_leave:  Option<ZoneCallback>,
}

impl ZoneGate {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, occupancy: AtomicUsize::new(0), on_enter: None, on_leave: None }
    }

    pub fn on_enter(mut self, f: impl Fn(AgentId, usize) + Send + Sync + 'static) -> Self {
        self.on_enter = Some(Box::new(f));
        self
    }

    pub fn on_leave(mut self, f: impl Fn(AgentId, usize) + Send + Sync + 'static) -> Self {
        self.on_leave = Some(Box::new(f));
        self
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn occupancy(&self) -> usize {
        self.occupancy.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.occupancy() >= self.capacity
    }

    /// Admit `agent` if there is room.
    pub fn try_enter(&self, agent: AgentId) -> bool {
        let entered = self
            .occupancy
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < self.capacity).then_some(n + 1));
        match entered {
            Ok(before) => {
                trace!(%agent, occupancy = before + 1, "entered zone");
                if let Some(f) = &self.on_enter {
                    f(agent, before + 1);
                }
                true
            }
            Err(_) => false,
        }
    }

    /// Record that `agent` left.  Fails if the zone is already empty.
    pub fn leave(&self, agent: AgentId) -> FleetResult<()> {
        let left = self
            .occupancy
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        let Ok(before) = left else {
            return Err(FleetError::ZoneEmpty(agent));
        };
        trace!(%agent, occupancy = before - 1, "left zone");
        if let Some(f) = &self.on_leave {
            f(agent, before - 1);
        }
        Ok(())
    }
}

impl fmt::Debug for ZoneGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoneGate")
            .field("capacity", &self.capacity)
            .field("occupancy", &self.occupancy())
            .finish_non_exhaustive()
    }
}
