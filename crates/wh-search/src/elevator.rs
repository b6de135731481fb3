//! Cross-tier route sequencing.
//!
//! Same search as [`crate::astar`] with elevator edges as extra successors.
//! A ride costs the edge's `time_travel`; the robot is at rest on both ends,
//! so a ride always ends a hop, and its heading on exit is left free.  Off
//! the goal's tier the straight-line heuristic means nothing and drops to
//! zero; on it, it is capped by the shortest ride so it stays consistent.

use wh_core::{ElevatorId, NodeId, Physics, Seconds};
use wh_graph::Graph;

use crate::astar::Forward;
use crate::SearchResult;

/// One elevator ride, in traversal order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElevatorLeg {
    pub elevator: ElevatorId,
    pub from:     NodeId,
    pub to:       NodeId,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElevatorRoute {
    pub legs:       Vec<ElevatorLeg>,
    /// Every node visited, start and goal included.
    pub nodes:      Vec<NodeId>,
    pub total_time: Seconds,
}

impl ElevatorRoute {
    /// Where the robot has to be to board the first elevator.
    pub fn first_boarding(&self) -> Option<NodeId> {
        self.legs.first().map(|l| l.from)
    }
}

/// Fastest route `from → to` across tiers, ignoring other robots.
///
/// Works within one tier too, returning no legs.  `Ok(None)` if `to` cannot
/// be reached.
pub fn elevator_route(
    graph: &Graph,
    physics: &Physics,
    from: NodeId,
    to: NodeId,
    can_pass_obstacles: bool,
) -> SearchResult<Option<ElevatorRoute>> {
    graph.check_node(from)?;
    graph.check_node(to)?;

    let mut problem = Forward::new(graph, physics, from, to, None, can_pass_obstacles, true);
    let Some(total_time) = problem.solve() else {
        return Ok(None);
    };
    let nodes = problem.route();
    let legs = problem
        .rides()
        .into_iter()
        .map(|(from, to, elevator)| ElevatorLeg { elevator, from, to })
        .collect();
    Ok(Some(ElevatorRoute { legs, nodes, total_time }))
}
