//! Unconstrained forward A*.
//!
//! No reservations, only node flags: the tool for static travel-time queries
//! and provisional routes.  Like the reverse search it steps from rest to
//! rest one straight hop at a time (see [`crate::hop`]), so a robot that
//! keeps going straight is charged one move, not one move per edge.
//!
//! The [`Forward`] problem also backs the elevator-sequencing search in
//! [`crate::elevator`], which switches on elevator successors.

use rustc_hash::FxHashMap;

use wh_core::{Angle, ElevatorId, NodeId, Physics, Seconds};
use wh_graph::Graph;

use crate::best_first::{BestFirst, SearchProblem, SearchStatus};
use crate::hop::{Hop, Rest, hop_nodes, hops_from, turn};
use crate::{Path, SearchResult};

/// Result of [`shortest_route`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StaticRoute {
    /// Every node visited, start and goal included.
    pub nodes: Vec<NodeId>,
    /// Hop-structured stops, start excluded.
    pub path: Path,
    pub total_time: Seconds,
}

/// Fastest route `from → to` ignoring other robots.
///
/// `orientation` charges the initial turn when the robot's heading is known.
/// Locked nodes (and obstacles unless `can_pass_obstacles`) are avoided,
/// except `to` itself.  `Ok(None)` if `to` cannot be reached.
pub fn shortest_route(
    graph: &Graph,
    physics: &Physics,
    from: NodeId,
    to: NodeId,
    orientation: Option<Angle>,
    can_pass_obstacles: bool,
) -> SearchResult<Option<StaticRoute>> {
    graph.check_node(from)?;
    graph.check_node(to)?;

    let mut problem = Forward::new(graph, physics, from, to, orientation, can_pass_obstacles, false);
    let Some(total_time) = problem.solve() else {
        return Ok(None);
    };
    let nodes = problem.route();
    let path = Path::from_nodes(graph, &nodes);
    Ok(Some(StaticRoute { nodes, path, total_time }))
}

// ── Forward problem ───────────────────────────────────────────────────────────

pub(crate) struct Forward<'a> {
    graph:              &'a Graph,
    physics:            &'a Physics,
    start:              Rest,
    goal:               NodeId,
    can_pass_obstacles: bool,
    elevators:          bool,
    /// Shortest ride anywhere, the floor of any cross-tier detour.
    min_ride:           Seconds,
    // Labels, indexed by `Rest::index`.
    g:                  Vec<Seconds>,
    prev:               Vec<Option<Rest>>,
    /// Edges in the hop that ended here; 0 after a ride.
    edges:              Vec<u32>,
    /// Elevator ridden into each state, if any.
    via:                Vec<Option<ElevatorId>>,
    /// Goal state once solved.
    found:              Option<Rest>,
    /// Moves out of the state being expanded, keyed by target state.
    pending:            FxHashMap<Rest, Step>,
    walk:               Vec<Hop>,
}

/// How a state is reached from the one being expanded.
#[derive(Copy, Clone, Debug)]
struct Step {
    cost:     Seconds,
    edges:    u32,
    elevator: Option<ElevatorId>,
}

impl<'a> Forward<'a> {
    pub(crate) fn new(
        graph: &'a Graph,
        physics: &'a Physics,
        start: NodeId,
        goal: NodeId,
        orientation: Option<Angle>,
        can_pass_obstacles: bool,
        elevators: bool,
    ) -> Self {
        let slots = graph.node_count() * Rest::SLOTS;
        let min_ride = if elevators {
            (0..graph.node_count())
                .flat_map(|i| graph.elevators_from(NodeId(i as u32)))
                .map(|lift| lift.time_travel)
                .fold(f64::INFINITY, f64::min)
        } else {
            f64::INFINITY
        };
        let start = Rest::new(start, orientation);
        let mut problem = Self {
            graph,
            physics,
            start,
            goal,
            can_pass_obstacles,
            elevators,
            min_ride,
            g: vec![f64::INFINITY; slots],
            prev: vec![None; slots],
            edges: vec![0; slots],
            via: vec![None; slots],
            found: None,
            pending: FxHashMap::default(),
            walk: Vec::new(),
        };
        problem.g[start.index()] = 0.0;
        problem
    }

    /// Run to the goal; its cost, or `None` if unreachable.
    pub(crate) fn solve(&mut self) -> Option<Seconds> {
        let start = self.start;
        let mut search = BestFirst::new();
        search.seed(self, start);
        match search.run(self, None) {
            SearchStatus::Found(goal) => {
                self.found = Some(goal);
                Some(self.g[goal.index()])
            }
            SearchStatus::Exhausted | SearchStatus::LimitReached => None,
        }
    }

    /// Rest states from start to goal.  Empty before a successful
    /// [`solve`](Self::solve).
    fn states(&self) -> Vec<Rest> {
        let mut states = Vec::new();
        let mut cur = self.found;
        while let Some(state) = cur {
            states.push(state);
            if states.len() > self.g.len() {
                break;
            }
            cur = self.prev[state.index()];
        }
        states.reverse();
        states
    }

    /// Every node from start to goal.
    pub(crate) fn route(&self) -> Vec<NodeId> {
        let states = self.states();
        let mut nodes: Vec<NodeId> = states.first().map(|s| s.node()).into_iter().collect();
        for w in states.windows(2) {
            let (from, to) = (w[0], w[1]);
            match to.angle() {
                Some(angle) if self.via[to.index()].is_none() => {
                    nodes.extend(hop_nodes(self.graph, from.node(), angle, self.edges[to.index()]));
                }
                _ => nodes.push(to.node()),
            }
        }
        nodes
    }

    /// Elevator rides on the found route as `(boarding, exit, elevator)`.
    pub(crate) fn rides(&self) -> Vec<(NodeId, NodeId, ElevatorId)> {
        self.states()
            .windows(2)
            .filter_map(|w| self.via[w[1].index()].map(|elevator| (w[0].node(), w[1].node(), elevator)))
            .collect()
    }

    fn admissible(&self, node: NodeId) -> bool {
        node == self.goal || !self.graph.is_blocked(node, self.can_pass_obstacles)
    }
}

impl SearchProblem for Forward<'_> {
    type Node = Rest;

    fn h(&mut self, state: Rest) -> f64 {
        let node = state.node();
        if self.elevators && self.graph.tier(node) != self.graph.tier(self.goal) {
            return 0.0;
        }
        let straight = self.physics.min_travel_time(self.graph.euclidean_distance(node, self.goal));
        straight.min(self.min_ride)
    }

    fn g(&self, state: Rest) -> f64 {
        self.g[state.index()]
    }

    fn g_prime(&mut self, parent: Rest, state: Rest) -> f64 {
        self.pending.get(&state).map_or(f64::INFINITY, |step| self.g[parent.index()] + step.cost)
    }

    fn successors(&mut self, state: Rest, out: &mut Vec<Rest>) {
        self.pending.clear();
        let graph = self.graph;
        let node = state.node();
        let mut walk = std::mem::take(&mut self.walk);
        let mut tried: Vec<Angle> = Vec::with_capacity(8);
        for e in graph.out_edges(node) {
            let angle = graph.edge_angle[e.index()];
            if tried.contains(&angle) {
                continue;
            }
            tried.push(angle);
            let turning = turn(self.physics, state.angle(), Some(angle));
            hops_from(graph, node, angle, |n| self.admissible(n), &mut walk);
            for hop in &walk {
                let next = Rest::new(hop.node, Some(angle));
                let cost = turning + self.physics.time_to_move(0.0, hop.length);
                self.pending.insert(next, Step { cost, edges: hop.edges, elevator: None });
                out.push(next);
            }
        }
        self.walk = walk;

        if self.elevators {
            for lift in graph.elevators_from(node) {
                if !self.admissible(lift.to) {
                    continue;
                }
                let next = Rest::new(lift.to, None);
                let step = Step { cost: lift.time_travel, edges: 0, elevator: Some(lift.elevator) };
                let fresh = !self.pending.contains_key(&next);
                if self.pending.get(&next).is_none_or(|held| step.cost < held.cost) {
                    self.pending.insert(next, step);
                }
                if fresh {
                    out.push(next);
                }
            }
        }
    }

    fn set_backpointer(&mut self, parent: Rest, state: Rest, g: f64, _h: f64) {
        if let Some(step) = self.pending.get(&state) {
            self.g[state.index()] = g;
            self.prev[state.index()] = Some(parent);
            self.edges[state.index()] = step.edges;
            self.via[state.index()] = step.elevator;
        }
    }

    fn stop_condition(&mut self, state: Rest) -> bool {
        state.node() == self.goal
    }
}
