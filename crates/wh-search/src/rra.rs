//! Reverse Resumable A* (RRA*).
//!
//! A backward search rooted at an agent's destination.  It works on rest
//! states (a node plus the angle of the first hop still to drive, see
//! [`crate::hop`]); the `g` of a state is the time-cost of the best route
//! from rest at that node, already facing that angle, to the destination,
//! ignoring other robots.  The windowed forward search consults it for every
//! state it generates.
//!
//! # Resumability
//!
//! The open and closed sets survive between queries.  Asking for a node that
//! is already settled is a lookup; asking for any other node resumes the
//! loop from the current frontier until one of its states is expanded.  The
//! internal heuristic points at a fixed origin (where the agent stood when
//! the search was created) and depends on the node only, so it is consistent
//! and the first state closed at a node carries the node's best cost.
//!
//! # Invalidation
//!
//! Nothing here watches the graph.  When the destination, the custom blocked
//! set or the graph's flags change, the owner must build a new instance;
//! [`ReverseResumable::is_stale`] compares flag generations for that purpose.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use wh_core::{Angle, NodeId, Physics, Seconds, TIME_EPSILON};
use wh_graph::Graph;

use crate::best_first::{BestFirst, SearchProblem, SearchStatus};
use crate::hop::{Hop, Rest, hop_nodes, hops_into, turn};
use crate::SearchResult;

/// Search labels, indexed by [`Rest::index`] unless noted.
struct Labels {
    g:       Vec<Seconds>,
    /// State the first hop ends in; `None` at the destination and at
    /// unreached states.
    next:    Vec<Option<Rest>>,
    /// Edges in the first hop.
    edges:   Vec<u32>,
    /// First state closed at each node, indexed by `NodeId`.
    settled: Vec<Option<Rest>>,
}

pub struct ReverseResumable {
    destination:        NodeId,
    origin:             NodeId,
    physics:            Physics,
    can_pass_obstacles: bool,
    blocked:            FxHashSet<NodeId>,
    bias:               FxHashMap<NodeId, Seconds>,
    flags_generation:   u64,
    labels:             Labels,
    frontier:           BestFirst<Rest>,
}

impl ReverseResumable {
    /// Root a new backward search at `destination`, aimed at `origin`.
    ///
    /// `blocked` nodes are never expanded in addition to the graph's locked
    /// (and, unless `can_pass_obstacles`, obstacle) nodes.  The destination
    /// and the origin are always admissible.
    pub fn new(
        graph: &Graph,
        physics: Physics,
        destination: NodeId,
        origin: NodeId,
        can_pass_obstacles: bool,
        blocked: FxHashSet<NodeId>,
    ) -> SearchResult<Self> {
        graph.check_node(destination)?;
        graph.check_node(origin)?;
        let n = graph.node_count();
        let mut rra = Self {
            destination,
            origin,
            physics,
            can_pass_obstacles,
            blocked,
            bias: FxHashMap::default(),
            flags_generation: graph.flags_generation(),
            labels: Labels {
                g:       vec![f64::INFINITY; n * Rest::SLOTS],
                next:    vec![None; n * Rest::SLOTS],
                edges:   vec![0; n * Rest::SLOTS],
                settled: vec![None; n],
            },
            frontier: BestFirst::new(),
        };
        let root = Rest::new(destination, None);
        rra.labels.g[root.index()] = 0.0;
        let Self { frontier, labels, blocked, physics, .. } = &mut rra;
        let mut problem = Backward {
            graph,
            physics,
            destination,
            origin,
            can_pass_obstacles,
            blocked,
            labels,
            target: NodeId::INVALID,
            pending: FxHashMap::default(),
            walk: Vec::new(),
        };
        frontier.seed(&mut problem, root);
        Ok(rra)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn destination(&self) -> NodeId {
        self.destination
    }

    #[inline]
    pub fn origin(&self) -> NodeId {
        self.origin
    }

    #[inline]
    pub fn physics(&self) -> &Physics {
        &self.physics
    }

    #[inline]
    pub fn can_pass_obstacles(&self) -> bool {
        self.can_pass_obstacles
    }

    pub fn blocked(&self) -> &FxHashSet<NodeId> {
        &self.blocked
    }

    /// Expansions performed over all queries so far.
    pub fn expansions(&self) -> usize {
        self.frontier.expansions()
    }

    /// `true` if `graph`'s flags changed since this search was built, or it
    /// is a different graph altogether.
    pub fn is_stale(&self, graph: &Graph) -> bool {
        graph.flags_generation() != self.flags_generation
            || graph.node_count() != self.labels.settled.len()
    }

    /// Extra cost added to [`heuristic`](Self::heuristic) at chosen nodes,
    /// e.g. to steer robots away from congested aisles.  Does not affect
    /// [`distance`](Self::distance).
    pub fn set_bias(&mut self, bias: FxHashMap<NodeId, Seconds>) {
        self.bias = bias;
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Time-cost of the best route from `node` to the destination, starting
    /// at rest with a free orientation.  `f64::INFINITY` if unreachable.
    pub fn distance(&mut self, graph: &Graph, node: NodeId) -> Seconds {
        if node.index() >= self.labels.settled.len() {
            return f64::INFINITY;
        }
        if let Some(state) = self.labels.settled[node.index()] {
            return self.labels.g[state.index()];
        }

        let before = self.frontier.expansions();
        let status = self.resume(graph, node, None);
        trace!(
            destination = %self.destination,
            target = %node,
            expanded = self.frontier.expansions() - before,
            "resumed reverse search"
        );
        match status {
            SearchStatus::Found(state) => self.labels.g[state.index()],
            SearchStatus::Exhausted | SearchStatus::LimitReached => f64::INFINITY,
        }
    }

    /// Forward-search heuristic for a robot resting at `node` facing
    /// `orientation`: the cheapest route from `node` counting the turn onto
    /// its first hop, plus any bias.
    ///
    /// Routes leaving `node` at other angles may cost more than
    /// [`distance`](Self::distance) but less once the turn is counted, so the
    /// search keeps expanding until no unexpanded state at `node` could still
    /// win.
    pub fn heuristic(&mut self, graph: &Graph, node: NodeId, orientation: Angle) -> Seconds {
        if !self.distance(graph, node).is_finite() {
            return f64::INFINITY;
        }
        let floor = self.physics.min_travel_time(graph.euclidean_distance(node, self.origin));
        let mut best = self.departure(node, orientation);
        while self.frontier.min_f().is_some_and(|f| f - floor < best - TIME_EPSILON) {
            if self.resume(graph, NodeId::INVALID, Some(1)) != SearchStatus::LimitReached {
                break;
            }
            best = self.departure(node, orientation);
        }
        best + self.bias.get(&node).copied().unwrap_or(0.0)
    }

    /// Best route from `node` to the destination, both ends included.
    pub fn route_from(&mut self, graph: &Graph, node: NodeId) -> Option<Vec<NodeId>> {
        if !self.distance(graph, node).is_finite() {
            return None;
        }
        let mut state = self.labels.settled[node.index()]?;
        let mut route = vec![node];
        while let Some(next) = self.labels.next[state.index()] {
            let angle = state.angle()?;
            route.extend(hop_nodes(graph, state.node(), angle, self.labels.edges[state.index()]));
            if route.last() != Some(&next.node()) || route.len() > self.labels.g.len() {
                return None;
            }
            state = next;
        }
        Some(route)
    }

    /// `true` if `node` lies on the best route from the origin.
    pub fn path_contains(&mut self, graph: &Graph, node: NodeId) -> bool {
        self.route_from(graph, self.origin).is_some_and(|route| route.contains(&node))
    }

    /// Nodes of the first hop of `node`'s best route: everything up to and
    /// including the next turning point (or the destination).  Empty at the
    /// destination or when unreachable.
    pub fn next_nodes_until_turn(&mut self, graph: &Graph, node: NodeId) -> Vec<NodeId> {
        if node == self.destination || !self.distance(graph, node).is_finite() {
            return Vec::new();
        }
        let Some(state) = self.labels.settled[node.index()] else {
            return Vec::new();
        };
        match state.angle() {
            Some(angle) => hop_nodes(graph, node, angle, self.labels.edges[state.index()]).collect(),
            None => Vec::new(),
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Cheapest expanded departure from `node` for a robot facing
    /// `orientation`.
    fn departure(&self, node: NodeId, orientation: Angle) -> Seconds {
        Rest::all_at(node)
            .filter(|&s| self.frontier.is_closed(s))
            .map(|s| self.labels.g[s.index()] + turn(&self.physics, Some(orientation), s.angle()))
            .fold(f64::INFINITY, f64::min)
    }

    fn resume(&mut self, graph: &Graph, target: NodeId, limit: Option<usize>) -> SearchStatus<Rest> {
        let Self { frontier, labels, blocked, physics, destination, origin, can_pass_obstacles, .. } = self;
        let mut problem = Backward {
            graph,
            physics,
            destination: *destination,
            origin: *origin,
            can_pass_obstacles: *can_pass_obstacles,
            blocked,
            labels,
            target,
            pending: FxHashMap::default(),
            walk: Vec::new(),
        };
        frontier.run(&mut problem, limit)
    }
}

// ── Backward problem ──────────────────────────────────────────────────────────

struct Backward<'a> {
    graph:              &'a Graph,
    physics:            &'a Physics,
    destination:        NodeId,
    origin:             NodeId,
    can_pass_obstacles: bool,
    blocked:            &'a FxHashSet<NodeId>,
    labels:             &'a mut Labels,
    target:             NodeId,
    /// Hops into the state being expanded, keyed by their start state.
    pending:            FxHashMap<Rest, Hop>,
    walk:               Vec<Hop>,
}

impl Backward<'_> {
    fn admissible(&self, node: NodeId) -> bool {
        node == self.destination
            || node == self.origin
            || !(self.graph.is_blocked(node, self.can_pass_obstacles) || self.blocked.contains(&node))
    }
}

impl SearchProblem for Backward<'_> {
    type Node = Rest;

    fn h(&mut self, state: Rest) -> f64 {
        self.physics.min_travel_time(self.graph.euclidean_distance(state.node(), self.origin))
    }

    fn g(&self, state: Rest) -> f64 {
        self.labels.g[state.index()]
    }

    fn g_prime(&mut self, parent: Rest, state: Rest) -> f64 {
        let Some(hop) = self.pending.get(&state) else {
            return f64::INFINITY;
        };
        self.labels.g[parent.index()]
            + turn(self.physics, state.angle(), parent.angle())
            + self.physics.time_to_move(0.0, hop.length)
    }

    fn successors(&mut self, state: Rest, out: &mut Vec<Rest>) {
        self.pending.clear();
        let graph = self.graph;
        let node = state.node();
        let mut walk = std::mem::take(&mut self.walk);
        let mut tried: Vec<Angle> = Vec::with_capacity(8);
        for e in graph.in_edges(node) {
            let angle = graph.edge_angle[e.index()];
            if tried.contains(&angle) {
                continue;
            }
            tried.push(angle);
            hops_into(graph, node, angle, |n| self.admissible(n), &mut walk);
            for hop in &walk {
                let pred = Rest::new(hop.node, Some(angle));
                self.pending.insert(pred, *hop);
                out.push(pred);
            }
        }
        self.walk = walk;
    }

    fn set_backpointer(&mut self, parent: Rest, state: Rest, g: f64, _h: f64) {
        if let Some(hop) = self.pending.get(&state) {
            self.labels.g[state.index()] = g;
            self.labels.next[state.index()] = Some(parent);
            self.labels.edges[state.index()] = hop.edges;
        }
    }

    fn stop_condition(&mut self, state: Rest) -> bool {
        let node = state.node();
        let slot = &mut self.labels.settled[node.index()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(state);
        node == self.target
    }
}
