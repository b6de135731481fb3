//! Where robots go next.
//!
//! Task assignment is outside the planner.  The driver asks a
//! [`DestinationPolicy`] whenever a robot has no destination or has just
//! reached it.

use wh_core::{AgentRng, NodeId};
use wh_fleet::Agent;
use wh_graph::Graph;

pub trait DestinationPolicy {
    /// The next destination for `agent`, or `None` to stay put until the
    /// next retry.
    fn next_destination(&mut self, agent: &Agent, graph: &Graph, rng: &mut AgentRng) -> Option<NodeId>;
}

/// Never hands out work.
pub struct Stay;

impl DestinationPolicy for Stay {
    fn next_destination(&mut self, _agent: &Agent, _graph: &Graph, _rng: &mut AgentRng) -> Option<NodeId> {
        None
    }
}

/// Each robot cycles through its own fixed list of stops.
pub struct Tour {
    stops:  Vec<Vec<NodeId>>,
    cursor: Vec<usize>,
}

impl Tour {
    /// `stops[i]` is the round of robot `i`.  Robots without a round stay.
    pub fn new(stops: Vec<Vec<NodeId>>) -> Self {
        let cursor = vec![0; stops.len()];
        Self { stops, cursor }
    }
}

impl DestinationPolicy for Tour {
    fn next_destination(&mut self, agent: &Agent, _graph: &Graph, _rng: &mut AgentRng) -> Option<NodeId> {
        let round = self.stops.get(agent.id.index())?;
        let cursor = self.cursor.get_mut(agent.id.index())?;
        let next = *round.get(*cursor % round.len().max(1))?;
        *cursor += 1;
        Some(next)
    }
}

/// Uniform random choice among candidate nodes, never the node the robot is
/// on.
pub struct RandomNodes {
    candidates: Vec<NodeId>,
}

impl RandomNodes {
    pub fn new(candidates: Vec<NodeId>) -> Self {
        Self { candidates }
    }
}

impl DestinationPolicy for RandomNodes {
    fn next_destination(&mut self, agent: &Agent, graph: &Graph, rng: &mut AgentRng) -> Option<NodeId> {
        let options: Vec<NodeId> = self
            .candidates
            .iter()
            .copied()
            .filter(|&n| n != agent.next_node && graph.contains(n))
            .collect();
        rng.choose(&options).copied()
    }
}
