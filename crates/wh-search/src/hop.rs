//! Rest states and straight hops, shared by the static searches.
//!
//! A robot stops only where its route turns, so consecutive same-angle edges
//! are driven as one accelerate–cruise–brake move.  The static searches
//! therefore step from rest to rest, one whole hop at a time, and remember
//! the angle of the hop that touches each rest point: the forward searches
//! the hop just driven, the reverse search the hop still to drive.  Keeping
//! that angle in the state (rather than one label per node) lets a route
//! carry straight on through a node whose own best route turns there.
//!
//! Hops follow [`Graph::next_in_direction`] from their start, which is how
//! the windowed search drives them.

use wh_core::{Angle, NodeId, Physics, Seconds};
use wh_graph::Graph;

/// A node plus the angle of the hop touching it; `None` for a free heading.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct Rest(u32);

impl Rest {
    /// Label slots per node: eight compass angles and the free heading.
    pub const SLOTS: usize = 9;

    const FREE: u32 = 8;

    #[inline]
    pub fn new(node: NodeId, angle: Option<Angle>) -> Self {
        let slot = angle.map_or(Self::FREE, |a| (a.degrees() / Angle::RESOLUTION_DEG) as u32);
        Rest(node.0 * Self::SLOTS as u32 + slot)
    }

    #[inline]
    pub fn node(self) -> NodeId {
        NodeId(self.0 / Self::SLOTS as u32)
    }

    #[inline]
    pub fn angle(self) -> Option<Angle> {
        match self.0 % Self::SLOTS as u32 {
            Self::FREE => None,
            slot => Some(Angle::from_degrees((slot * Angle::RESOLUTION_DEG as u32) as f64)),
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Every state at `node`.
    pub fn all_at(node: NodeId) -> impl Iterator<Item = Rest> {
        let base = node.0 * Self::SLOTS as u32;
        (0..Self::SLOTS as u32).map(move |slot| Rest(base + slot))
    }
}

/// Turn between two hop angles; free when either side has no heading.
#[inline]
pub(crate) fn turn(physics: &Physics, from: Option<Angle>, to: Option<Angle>) -> Seconds {
    match (from, to) {
        (Some(a), Some(b)) => physics.time_to_turn(a, b),
        _ => 0.0,
    }
}

/// One straight hop: its far end, length and number of edges.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Hop {
    pub node:   NodeId,
    pub length: f64,
    pub edges:  u32,
}

/// Every stopping point of a straight hop leaving `from` at `angle`, nearest
/// first.  The walk ends before the first node `pass` rejects.
pub(crate) fn hops_from(
    graph: &Graph,
    from: NodeId,
    angle: Angle,
    mut pass: impl FnMut(NodeId) -> bool,
    out: &mut Vec<Hop>,
) {
    out.clear();
    let mut cur = from;
    let mut length = 0.0;
    while out.len() < graph.node_count() {
        let Some(e) = graph.next_in_direction(cur, angle) else { break };
        let next = graph.edge_to[e.index()];
        if !pass(next) {
            break;
        }
        length += graph.edge_distance[e.index()];
        out.push(Hop { node: next, length, edges: out.len() as u32 + 1 });
        cur = next;
    }
}

/// Every start of a straight hop at `angle` that stops at `to`.  Nodes
/// `pass` rejects neither start a hop nor are driven through.
pub(crate) fn hops_into(
    graph: &Graph,
    to: NodeId,
    angle: Angle,
    mut pass: impl FnMut(NodeId) -> bool,
    out: &mut Vec<Hop>,
) {
    out.clear();
    let mut stack = vec![Hop { node: to, length: 0.0, edges: 0 }];
    while let Some(at) = stack.pop() {
        if at.edges as usize >= graph.node_count() {
            continue;
        }
        for e in graph.in_edges(at.node) {
            let from = graph.edge_from[e.index()];
            if graph.edge_angle[e.index()] != angle || graph.next_in_direction(from, angle) != Some(e) {
                continue;
            }
            if !pass(from) {
                continue;
            }
            let hop = Hop { node: from, length: at.length + graph.edge_distance[e.index()], edges: at.edges + 1 };
            out.push(hop);
            stack.push(hop);
        }
    }
}

/// The `edges` nodes after `from` on a straight hop at `angle`.
pub(crate) fn hop_nodes(graph: &Graph, from: NodeId, angle: Angle, edges: u32) -> impl Iterator<Item = NodeId> + '_ {
    let mut cur = from;
    (0..edges).map_while(move |_| {
        let e = graph.next_in_direction(cur, angle)?;
        cur = graph.edge_to[e.index()];
        Some(cur)
    })
}
