//! Floor graph representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format twice over the same
//! edge arrays.  Given a `NodeId n`, its outgoing edges are the contiguous
//! `EdgeId` range
//!
//! ```text
//! out_start[n] .. out_start[n+1]
//! ```
//!
//! and its incoming edges are `in_edge[ in_start[n] .. in_start[n+1] ]`.
//! Edge arrays (`edge_from`, `edge_to`, `edge_distance`, `edge_angle`) are
//! sorted by source node and indexed by `EdgeId`, so forward expansion is a
//! contiguous scan and backward expansion (used by the reverse heuristic
//! search) is one indirection away.
//!
//! Elevator edges live in their own CSR block: they are consulted only by the
//! cross-tier search, and keeping them out of the regular arrays means the
//! single-tier searches never have to filter them.
//!
//! # Mutable flags
//!
//! Topology is frozen at [`GraphBuilder::build`].  The only mutable state is
//! the per-node `obstacle` / `locked` pair, toggled between planning calls.
//! Every change bumps [`Graph::flags_generation`] so cached backward searches
//! can tell that their closed set is stale.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use wh_core::{Angle, EdgeId, ElevatorId, NodeId, Point2, Seconds, TierId};

use crate::{GraphError, GraphResult};

// ── ElevatorEdge ──────────────────────────────────────────────────────────────

/// A directed cross-tier connection served by a physical elevator.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElevatorEdge {
    pub from: NodeId,
    pub to: NodeId,
    /// Ride duration on top of the robot's own movement, seconds.
    pub time_travel: Seconds,
    /// Carried through to the executor, never interpreted by the planner.
    pub elevator: ElevatorId,
}

// ── Graph ─────────────────────────────────────────────────────────────────────

/// Directed floor graph in CSR format.
///
/// Array fields are `pub` for direct indexed access on hot paths.  Do not
/// construct directly; use [`GraphBuilder`].
pub struct Graph {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Floor position of each node.  Indexed by `NodeId`.
    pub node_pos: Vec<Point2>,

    /// Tier of each node.
    pub node_tier: Vec<TierId>,

    obstacle: Vec<bool>,
    locked: Vec<bool>,
    flags_generation: u64,

    // ── Forward CSR ───────────────────────────────────────────────────────
    /// Outgoing edges of node `n` are `out_start[n] .. out_start[n+1]`.
    /// Length = `node_count + 1`.
    pub out_start: Vec<u32>,

    // ── Backward CSR ──────────────────────────────────────────────────────
    /// Incoming edges of node `n` are `in_edge[in_start[n] .. in_start[n+1]]`.
    pub in_start: Vec<u32>,
    pub in_edge: Vec<EdgeId>,

    // ── Edge data (indexed by EdgeId) ─────────────────────────────────────
    pub edge_from: Vec<NodeId>,
    pub edge_to: Vec<NodeId>,
    /// Edge length in metres.
    pub edge_distance: Vec<f64>,
    /// Direction of travel, quantized to the compass.
    pub edge_angle: Vec<Angle>,

    // ── Elevator CSR ──────────────────────────────────────────────────────
    pub elevator_start: Vec<u32>,
    pub elevator_edges: Vec<ElevatorEdge>,
}

impl Graph {
    /// Construct an empty graph with no nodes or edges.
    ///
    /// Useful as a placeholder; every route request against it reports
    /// infeasibility.
    pub fn empty() -> Self {
        Self {
            node_pos:         Vec::new(),
            node_tier:        Vec::new(),
            obstacle:         Vec::new(),
            locked:           Vec::new(),
            flags_generation: 0,
            out_start:        vec![0],
            in_start:         vec![0],
            in_edge:          Vec::new(),
            edge_from:        Vec::new(),
            edge_to:          Vec::new(),
            edge_distance:    Vec::new(),
            edge_angle:       Vec::new(),
            elevator_start:   vec![0],
            elevator_edges:   Vec::new(),
        }
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        node.index() < self.node_count()
    }

    /// Error unless `node` exists.
    pub fn check_node(&self, node: NodeId) -> GraphResult<()> {
        if self.contains(node) { Ok(()) } else { Err(GraphError::NodeNotFound(node)) }
    }

    // ── Traversal ─────────────────────────────────────────────────────────

    /// Outgoing regular edges of `node`.  Contiguous range, no allocation.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.out_start[node.index()] as usize;
        let end   = self.out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    /// Incoming regular edges of `node`.
    #[inline]
    pub fn in_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.in_start[node.index()] as usize;
        let end   = self.in_start[node.index() + 1] as usize;
        self.in_edge[start..end].iter().copied()
    }

    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        (self.out_start[node.index() + 1] - self.out_start[node.index()]) as usize
    }

    /// Elevator edges leaving `node`.
    #[inline]
    pub fn elevators_from(&self, node: NodeId) -> &[ElevatorEdge] {
        let start = self.elevator_start[node.index()] as usize;
        let end   = self.elevator_start[node.index() + 1] as usize;
        &self.elevator_edges[start..end]
    }

    /// The outgoing edge of `node` pointing in `angle`, if any.  Following this
    /// repeatedly walks a hop.
    pub fn next_in_direction(&self, node: NodeId, angle: Angle) -> Option<EdgeId> {
        self.out_edges(node).find(|e| self.edge_angle[e.index()] == angle)
    }

    /// The regular edge `from → to`, if any.
    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        self.out_edges(from).find(|e| self.edge_to[e.index()] == to)
    }

    // ── Node flags ────────────────────────────────────────────────────────

    #[inline]
    pub fn is_obstacle(&self, node: NodeId) -> bool {
        self.obstacle[node.index()]
    }

    #[inline]
    pub fn is_locked(&self, node: NodeId) -> bool {
        self.locked[node.index()]
    }

    /// `true` if a robot must not enter `node`: it is locked, or it is an
    /// obstacle and the robot may not pass under obstacles.
    #[inline]
    pub fn is_blocked(&self, node: NodeId, can_pass_obstacles: bool) -> bool {
        self.locked[node.index()] || (!can_pass_obstacles && self.obstacle[node.index()])
    }

    pub fn set_obstacle(&mut self, node: NodeId, value: bool) -> GraphResult<()> {
        self.check_node(node)?;
        if self.obstacle[node.index()] != value {
            self.obstacle[node.index()] = value;
            self.flags_generation += 1;
        }
        Ok(())
    }

    pub fn set_locked(&mut self, node: NodeId, value: bool) -> GraphResult<()> {
        self.check_node(node)?;
        if self.locked[node.index()] != value {
            self.locked[node.index()] = value;
            self.flags_generation += 1;
        }
        Ok(())
    }

    /// Counter bumped by every effective flag change.
    #[inline]
    pub fn flags_generation(&self) -> u64 {
        self.flags_generation
    }

    // ── Geometry ──────────────────────────────────────────────────────────

    #[inline]
    pub fn position(&self, node: NodeId) -> Point2 {
        self.node_pos[node.index()]
    }

    #[inline]
    pub fn tier(&self, node: NodeId) -> TierId {
        self.node_tier[node.index()]
    }

    /// Straight-line distance, ignoring tiers.
    #[inline]
    pub fn euclidean_distance(&self, a: NodeId, b: NodeId) -> f64 {
        self.node_pos[a.index()].distance(self.node_pos[b.index()])
    }

    /// Length of the shortest regular-edge route `from → to` in metres.
    ///
    /// Dijkstra over `edge_distance`, never entering blocked nodes except
    /// `to` itself.  `None` if `to` is unreachable (including across tiers).
    pub fn shortest_distance(
        &self,
        from: NodeId,
        to: NodeId,
        can_pass_obstacles: bool,
    ) -> GraphResult<Option<f64>> {
        self.check_node(from)?;
        self.check_node(to)?;
        if from == to {
            return Ok(Some(0.0));
        }

        let mut dist = vec![f64::INFINITY; self.node_count()];
        dist[from.index()] = 0.0;

        // Min-heap via Reverse; NodeId breaks ties deterministically.
        let mut heap: BinaryHeap<Reverse<(OrderedFloat<f64>, NodeId)>> = BinaryHeap::new();
        heap.push(Reverse((OrderedFloat(0.0), from)));

        while let Some(Reverse((OrderedFloat(cost), node))) = heap.pop() {
            if node == to {
                return Ok(Some(cost));
            }
            // Skip stale heap entries.
            if cost > dist[node.index()] {
                continue;
            }
            for edge in self.out_edges(node) {
                let next = self.edge_to[edge.index()];
                if next != to && self.is_blocked(next, can_pass_obstacles) {
                    continue;
                }
                let new_cost = cost + self.edge_distance[edge.index()];
                if new_cost < dist[next.index()] {
                    dist[next.index()] = new_cost;
                    heap.push(Reverse((OrderedFloat(new_cost), next)));
                }
            }
        }
        Ok(None)
    }
}

// ── GraphBuilder ──────────────────────────────────────────────────────────────

/// Construct a [`Graph`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use wh_core::{Point2, TierId};
/// use wh_graph::GraphBuilder;
///
/// let mut b = GraphBuilder::new();
/// let a = b.add_node(Point2::new(0.0, 0.0), TierId(0));
/// let c = b.add_node(Point2::new(1.0, 0.0), TierId(0));
/// b.add_edge(a, c);
/// let graph = b.build().unwrap();
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 2); // bidirectional
/// ```
pub struct GraphBuilder {
    nodes:     Vec<(Point2, TierId)>,
    obstacles: Vec<NodeId>,
    raw_edges: Vec<(NodeId, NodeId)>,
    elevators: Vec<ElevatorEdge>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            nodes:     Vec::new(),
            obstacles: Vec::new(),
            raw_edges: Vec::new(),
            elevators: Vec::new(),
        }
    }

    /// Add a node and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, pos: Point2, tier: TierId) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push((pos, tier));
        id
    }

    /// Mark a node as an obstacle from the start (e.g. a storage location
    /// holding a pod).
    pub fn mark_obstacle(&mut self, node: NodeId) {
        self.obstacles.push(node);
    }

    /// Add a **directed** same-tier edge.  Length and angle are derived from
    /// the node positions.
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId) {
        self.raw_edges.push((from, to));
    }

    /// Add edges in **both directions** (the common aisle case).
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) {
        self.add_directed_edge(a, b);
        self.add_directed_edge(b, a);
    }

    /// Add a directed elevator connection between tiers.
    pub fn add_elevator_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        time_travel: Seconds,
        elevator: ElevatorId,
    ) {
        self.elevators.push(ElevatorEdge { from, to, time_travel, elevator });
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Validate and freeze the graph.
    ///
    /// Time complexity: O(E log E) for the edge sorts.
    pub fn build(self) -> GraphResult<Graph> {
        let node_count = self.nodes.len();
        let check = |n: NodeId| {
            if n.index() < node_count { Ok(()) } else { Err(GraphError::NodeNotFound(n)) }
        };

        for &(from, to) in &self.raw_edges {
            check(from)?;
            check(to)?;
            if from == to {
                return Err(GraphError::SelfLoop(from));
            }
            if self.nodes[from.index()].1 != self.nodes[to.index()].1 {
                return Err(GraphError::CrossTierEdge { from, to });
            }
        }
        for e in &self.elevators {
            check(e.from)?;
            check(e.to)?;
            if !e.time_travel.is_finite() || e.time_travel < 0.0 {
                return Err(GraphError::InvalidTravelTime { from: e.from, to: e.to, value: e.time_travel });
            }
        }
        for &n in &self.obstacles {
            check(n)?;
        }

        let node_pos:  Vec<Point2> = self.nodes.iter().map(|&(p, _)| p).collect();
        let node_tier: Vec<TierId> = self.nodes.iter().map(|&(_, t)| t).collect();

        // Sort edges by (source, target) for CSR construction and stable ids.
        let mut raw = self.raw_edges;
        raw.sort_unstable_by_key(|&(from, to)| (from.0, to.0));
        raw.dedup();
        let edge_count = raw.len();

        let edge_from: Vec<NodeId> = raw.iter().map(|&(f, _)| f).collect();
        let edge_to:   Vec<NodeId> = raw.iter().map(|&(_, t)| t).collect();
        let edge_distance: Vec<f64> = raw
            .iter()
            .map(|&(f, t)| node_pos[f.index()].distance(node_pos[t.index()]))
            .collect();
        let edge_angle: Vec<Angle> = raw
            .iter()
            .map(|&(f, t)| node_pos[f.index()].angle_to(node_pos[t.index()]))
            .collect();

        let out_start = csr_offsets(node_count, raw.iter().map(|&(f, _)| f));
        debug_assert_eq!(out_start[node_count] as usize, edge_count);

        // Backward CSR: edge ids grouped by target node.
        let in_start = csr_offsets(node_count, raw.iter().map(|&(_, t)| t));
        let mut fill = in_start.clone();
        let mut in_edge = vec![EdgeId::INVALID; edge_count];
        for (i, &(_, to)) in raw.iter().enumerate() {
            let slot = &mut fill[to.index()];
            in_edge[*slot as usize] = EdgeId(i as u32);
            *slot += 1;
        }

        let mut elevator_edges = self.elevators;
        elevator_edges.sort_by_key(|e| (e.from.0, e.to.0, e.elevator.0));
        let elevator_start = csr_offsets(node_count, elevator_edges.iter().map(|e| e.from));

        let mut obstacle = vec![false; node_count];
        for n in self.obstacles {
            obstacle[n.index()] = true;
        }

        Ok(Graph {
            node_pos,
            node_tier,
            obstacle,
            locked: vec![false; node_count],
            flags_generation: 0,
            out_start,
            in_start,
            in_edge,
            edge_from,
            edge_to,
            edge_distance,
            edge_angle,
            elevator_start,
            elevator_edges,
        })
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// CSR row pointer from a key stream (keys need not be sorted for counting).
fn csr_offsets(node_count: usize, keys: impl Iterator<Item = NodeId>) -> Vec<u32> {
    let mut start = vec![0u32; node_count + 1];
    for k in keys {
        start[k.index() + 1] += 1;
    }
    for i in 1..=node_count {
        start[i] += start[i - 1];
    }
    start
}
