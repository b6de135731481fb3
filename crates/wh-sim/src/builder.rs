//! Fluent builder for constructing a [`Sim`].

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

use wh_core::{AgentRng, Angle, NodeId};
use wh_fleet::{Agent, FleetPlanner};
use wh_graph::Graph;

use crate::{DestinationPolicy, Sim, SimConfig, SimError, SimResult, SimStats};

/// Fluent builder for [`Sim<P>`].
///
/// # Required inputs
///
/// - [`SimConfig`]: horizon, seed, retry delay, planner tuning
/// - the floor [`Graph`]
/// - `P: DestinationPolicy`
/// - the robots, with `agents[i].id == AgentId(i)`
///
/// # Optional inputs (have defaults)
///
/// | Method                      | Default                       |
/// |-----------------------------|-------------------------------|
/// | `.initial_positions(v)`     | Each robot's `next_node`      |
/// | `.initial_orientations(v)`  | Each robot's `orientation`    |
pub struct SimBuilder<P: DestinationPolicy> {
    config:       SimConfig,
    graph:        Graph,
    policy:       P,
    agents:       Vec<Agent>,
    positions:    Option<Vec<NodeId>>,
    orientations: Option<Vec<Angle>>,
}

impl<P: DestinationPolicy> SimBuilder<P> {
    pub fn new(config: SimConfig, graph: Graph, policy: P, agents: Vec<Agent>) -> Self {
        Self { config, graph, policy, agents, positions: None, orientations: None }
    }

    /// Starting node of each robot.  Must be length `agent_count`.
    pub fn initial_positions(mut self, positions: Vec<NodeId>) -> Self {
        self.positions = Some(positions);
        self
    }

    /// Starting heading of each robot.  Must be length `agent_count`.
    pub fn initial_orientations(mut self, orientations: Vec<Angle>) -> Self {
        self.orientations = Some(orientations);
        self
    }

    /// Validate inputs, place every robot at time 0, and schedule each for
    /// its first plan.
    pub fn build(self) -> SimResult<Sim<P>> {
        self.config.validate()?;
        let agent_count = self.agents.len();
        let mut agents = self.agents;

        if let Some((i, a)) = agents.iter().enumerate().find(|(i, a)| a.id.index() != *i) {
            return Err(SimError::Config(format!("agent at index {i} has id {}", a.id)));
        }

        let positions = match self.positions {
            Some(p) if p.len() != agent_count => {
                return Err(SimError::AgentCountMismatch {
                    expected: agent_count,
                    got:      p.len(),
                    what:     "initial positions",
                });
            }
            Some(p) => p,
            None => agents.iter().map(|a| a.next_node).collect(),
        };
        let orientations = match self.orientations {
            Some(o) if o.len() != agent_count => {
                return Err(SimError::AgentCountMismatch {
                    expected: agent_count,
                    got:      o.len(),
                    what:     "initial orientations",
                });
            }
            Some(o) => o,
            None => agents.iter().map(|a| a.orientation).collect(),
        };

        // ── Place robots and seed the event queue ─────────────────────────
        let mut planner = FleetPlanner::new(self.config.planner)?;
        for ((agent, &node), &orientation) in agents.iter_mut().zip(&positions).zip(&orientations) {
            planner.place(&self.graph, agent, node, 0.0, orientation)?;
            agent.destination = NodeId::INVALID;
        }
        let mut events = BTreeMap::new();
        if agent_count > 0 {
            events.insert(OrderedFloat(0.0), agents.iter().map(|a| a.id).collect());
        }
        let rngs = agents.iter().map(|a| AgentRng::new(self.config.seed, a.id)).collect();

        Ok(Sim {
            config: self.config,
            graph: self.graph,
            planner,
            agents,
            rngs,
            policy: self.policy,
            events,
            now: 0.0,
            last_prune: 0.0,
            stats: SimStats::default(),
        })
    }
}
