//! Route and plan result types.

use wh_core::{Angle, NodeId, Seconds};
use wh_graph::Graph;
use wh_reserve::Interval;

// ── Path ──────────────────────────────────────────────────────────────────────

/// One entry of a [`Path`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathStop {
    pub node: NodeId,
    /// `true` where the robot comes to rest (hop end or wait); `false` for
    /// nodes driven through.
    pub is_stop: bool,
    /// Time spent resting here after arrival.
    pub wait: Seconds,
}

/// Ordered stops of a route, excluding the node the robot starts on unless
/// it waits there first.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path {
    pub stops: Vec<PathStop>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hop-structured path along `nodes` (first node excluded): turning
    /// points and the last node are stops.
    pub fn from_nodes(graph: &Graph, nodes: &[NodeId]) -> Self {
        let mut path = Self::new();
        for (i, w) in nodes.windows(2).enumerate() {
            let is_stop = match nodes.get(i + 2) {
                Some(&after) => edge_angle(graph, w[0], w[1]) != edge_angle(graph, w[1], after),
                None => true,
            };
            path.stops.push(PathStop { node: w[1], is_stop, wait: 0.0 });
        }
        path
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Last node of the path.
    pub fn last_node(&self) -> Option<NodeId> {
        self.stops.last().map(|s| s.node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.stops.iter().map(|s| s.node)
    }

    /// Sum of all waits.
    pub fn total_wait(&self) -> Seconds {
        self.stops.iter().map(|s| s.wait).sum()
    }

    pub(crate) fn push_waypoint(&mut self, node: NodeId) {
        self.stops.push(PathStop { node, is_stop: false, wait: 0.0 });
    }

    pub(crate) fn push_stop(&mut self, node: NodeId) {
        self.stops.push(PathStop { node, is_stop: true, wait: 0.0 });
    }

    /// Rest at `node` for `wait` more seconds, extending the last stop if the
    /// robot is already resting there.
    pub(crate) fn add_wait(&mut self, node: NodeId, wait: Seconds) {
        match self.stops.last_mut() {
            Some(last) if last.node == node && last.is_stop => last.wait += wait,
            _ => self.stops.push(PathStop { node, is_stop: true, wait }),
        }
    }

    /// Append `other`, merging a leading wait on the current last stop.
    pub fn extend(&mut self, other: Path) {
        for stop in other.stops {
            if stop.is_stop && stop.wait > 0.0 && self.last_node() == Some(stop.node) {
                self.add_wait(stop.node, stop.wait);
            } else {
                self.stops.push(stop);
            }
        }
    }
}

fn edge_angle(graph: &Graph, from: NodeId, to: NodeId) -> Option<Angle> {
    graph.edge_between(from, to).map(|e| graph.edge_angle[e.index()])
}

// ── Plan ──────────────────────────────────────────────────────────────────────

/// A windowed route together with the claims it needs.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plan {
    pub path: Path,
    /// Coalesced claims in chronological order of the actions that produced
    /// them; ends with a permanent rest claim when one was requested.
    pub intervals: Vec<Interval>,
    pub start_time: Seconds,
    /// Arrival time at `end_node`.
    pub end_time: Seconds,
    pub end_node: NodeId,
    pub end_orientation: Angle,
}

impl Plan {
    /// The zero-length plan of a robot already where it needs to be.
    pub fn stay(node: NodeId, time: Seconds, orientation: Angle) -> Self {
        Self {
            path: Path::new(),
            intervals: Vec::new(),
            start_time: time,
            end_time: time,
            end_node: node,
            end_orientation: orientation,
        }
    }

    #[inline]
    pub fn duration(&self) -> Seconds {
        self.end_time - self.start_time
    }
}

/// Result of a windowed planning call.
#[derive(Clone, Debug, PartialEq)]
pub enum PlanOutcome {
    /// The destination was reached.
    Found(Plan),
    /// The horizon was reached first; the plan ends at the horizon and is
    /// still conflict-free.
    WindowExceeded(Plan),
    /// No conflict-free continuation exists.
    Infeasible,
}

impl PlanOutcome {
    pub fn plan(&self) -> Option<&Plan> {
        match self {
            PlanOutcome::Found(p) | PlanOutcome::WindowExceeded(p) => Some(p),
            PlanOutcome::Infeasible => None,
        }
    }

    pub fn into_plan(self) -> Option<Plan> {
        match self {
            PlanOutcome::Found(p) | PlanOutcome::WindowExceeded(p) => Some(p),
            PlanOutcome::Infeasible => None,
        }
    }

    #[inline]
    pub fn is_found(&self) -> bool {
        matches!(self, PlanOutcome::Found(_))
    }

    /// Short tag for logs.
    pub fn label(&self) -> &'static str {
        match self {
            PlanOutcome::Found(_) => "found",
            PlanOutcome::WindowExceeded(_) => "window_exceeded",
            PlanOutcome::Infeasible => "infeasible",
        }
    }
}
