//! Simulation observer trait for progress reporting and data collection.

use wh_core::{AgentId, NodeId, Seconds};
use wh_fleet::Agent;
use wh_search::{ElevatorLeg, PlanOutcome};

use crate::SimStats;

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] as events are
/// processed.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example — task counter
///
/// ```rust,ignore
/// struct Deliveries(usize);
///
/// impl SimObserver for Deliveries {
///     fn on_task_complete(&mut self, _time: Seconds, _agent: AgentId, _node: NodeId) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait SimObserver {
    /// A robot's event fired, before anything is done for it.
    fn on_event(&mut self, _time: Seconds, _agent: AgentId) {}

    /// A robot reached its destination.
    fn on_task_complete(&mut self, _time: Seconds, _agent: AgentId, _node: NodeId) {}

    /// A plan was computed (and, unless infeasible, committed).  `agent`
    /// already reflects the plan.
    fn on_plan(&mut self, _time: Seconds, _agent: &Agent, _outcome: &PlanOutcome) {}

    /// A robot boarded an elevator.
    fn on_elevator(&mut self, _time: Seconds, _agent: AgentId, _leg: &ElevatorLeg) {}

    /// Called once after the last event.
    fn on_sim_end(&mut self, _time: Seconds, _stats: &SimStats) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
