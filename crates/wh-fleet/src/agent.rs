//! Per-robot planning state.

use wh_core::{AgentId, Angle, CoreResult, KinematicProfile, NodeId, Physics, Seconds};
use wh_search::Plan;

/// Everything the planner needs to know about one robot.
///
/// A robot plans from `next_node` at `arrival_time`: while it is driving a
/// committed plan, that is where the plan ends; once it is at rest, it equals
/// `current_node`.  An unplaced robot has both nodes set to
/// `NodeId::INVALID`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Agent {
    pub id: AgentId,

    /// Node the robot last departed from, or rests on.
    pub current_node: NodeId,

    /// Node the robot is heading to.  Equals `current_node` at rest.
    pub next_node: NodeId,

    /// When the robot reaches (or reached) `next_node`.
    pub arrival_time: Seconds,

    /// Heading on arrival at `next_node`.
    pub orientation: Angle,

    pub destination: NodeId,

    /// May the robot drive across `Obstacle` nodes.
    pub can_go_through_obstacles: bool,

    /// Planning horizon override.  `None` uses the planner's window.
    pub window: Option<Seconds>,

    physics: Physics,
}

impl Agent {
    /// A robot not yet on the floor.  Fails on an invalid profile.
    pub fn new(id: AgentId, profile: KinematicProfile) -> CoreResult<Self> {
        Ok(Self {
            id,
            current_node: NodeId::INVALID,
            next_node: NodeId::INVALID,
            arrival_time: 0.0,
            orientation: Angle::EAST,
            destination: NodeId::INVALID,
            can_go_through_obstacles: false,
            window: None,
            physics: Physics::new(profile)?,
        })
    }

    /// Builder-style initial placement: at rest on `node` from `time`, with
    /// `node` as destination.
    pub fn at(mut self, node: NodeId, time: Seconds, orientation: Angle) -> Self {
        self.rest(node, time, orientation);
        self.destination = node;
        self
    }

    #[inline]
    pub fn physics(&self) -> &Physics {
        &self.physics
    }

    #[inline]
    pub fn profile(&self) -> &KinematicProfile {
        &self.physics.profile
    }

    /// Swap the kinematic limits.  Cached heuristics built with the old
    /// limits are rebuilt on the next plan.
    pub fn set_profile(&mut self, profile: KinematicProfile) -> CoreResult<()> {
        self.physics = Physics::new(profile)?;
        Ok(())
    }

    #[inline]
    pub fn is_placed(&self) -> bool {
        self.next_node.is_valid()
    }

    #[inline]
    pub fn is_in_transit(&self) -> bool {
        self.current_node != self.next_node
    }

    #[inline]
    pub fn at_destination(&self) -> bool {
        self.is_placed() && self.next_node == self.destination
    }

    /// Put the robot at rest on `node`.
    pub fn rest(&mut self, node: NodeId, time: Seconds, orientation: Angle) {
        self.current_node = node;
        self.next_node = node;
        self.arrival_time = time;
        self.orientation = orientation;
    }

    /// Start driving a committed plan.  The robot leaves `next_node` and
    /// will be at the plan's end node, heading, and time.
    pub fn follow(&mut self, plan: &Plan) {
        self.current_node = self.next_node;
        self.next_node = plan.end_node;
        self.arrival_time = plan.end_time;
        self.orientation = plan.end_orientation;
    }

    /// Mark the current plan as driven.  No-op at rest.
    pub fn arrive(&mut self) {
        self.current_node = self.next_node;
    }
}
