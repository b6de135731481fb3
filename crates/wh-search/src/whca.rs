//! Windowed Hierarchical Cooperative A* (WHCA*).
//!
//! The cooperative planner.  It searches a space-time graph that is never
//! built up front: each generated state is a `(node, arrival time, heading)`
//! triple appended to an arena and addressed by [`StateId`].  From a state at
//! node `n` and time `t` the successors are
//!
//! 1. a **wait** at `n` until `t + wait_step`, if `n` is free for that span;
//! 2. per outgoing direction, one **move** per hop prefix: the robot turns on
//!    the spot (the turn span must be free before anything else is tried),
//!    then drives straight, stopping at the prefix's last node.  Prefixes are
//!    extended node by node and the walk stops at the first prefix whose
//!    claims collide with the reservation table.
//!
//! Locked nodes, and obstacles unless the robot may pass under them, are
//! never entered except as the destination.  States at or past the window
//! end only wait.
//!
//! The search ends at the first expanded state that is at the destination or
//! past the window end.  With `final_reservation` that state must also be free
//! from its arrival onwards, so the robot can legally stay there.
//!
//! `h` comes from a [`ReverseResumable`] search rooted at the destination and
//! `g` is elapsed time, so states are ordered by estimated arrival time.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use wh_core::{AgentId, Angle, NodeId, Physics, Seconds, TIME_EPSILON};
use wh_graph::Graph;
use wh_reserve::{Interval, ReservationTable, build_intervals, coalesce};

use crate::best_first::{BestFirst, SearchProblem, SearchStatus};
use crate::rra::ReverseResumable;
use crate::{Path, Plan, PlanOutcome, SearchError, SearchResult};

// ── Configuration ─────────────────────────────────────────────────────────────

/// Tuning knobs of the windowed search.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WhcaConfig {
    /// Planning horizon after the start time, seconds.
    pub window: Seconds,
    /// Length of one wait action, seconds.
    pub wait_step: Seconds,
    /// Drop move successors whose arrival at a node is not strictly later
    /// than the latest arrival already generated there in this search.
    pub tie_breaking: bool,
    /// Require the final state to be free forever and reserve it.
    pub final_reservation: bool,
    /// Expansion budget per call; exceeding it reports `Infeasible`.
    pub max_expansions: usize,
}

impl Default for WhcaConfig {
    fn default() -> Self {
        Self {
            window:            30.0,
            wait_step:         0.5,
            tie_breaking:      true,
            final_reservation: true,
            max_expansions:    50_000,
        }
    }
}

impl WhcaConfig {
    pub fn validate(&self) -> SearchResult<()> {
        if !(self.wait_step.is_finite() && self.wait_step > 0.0) {
            return Err(SearchError::InvalidWaitStep(self.wait_step));
        }
        if self.window.is_nan() || self.window < 0.0 {
            return Err(SearchError::InvalidWindow(self.window));
        }
        Ok(())
    }
}

/// One planning request.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Query {
    /// Only used for logging.
    pub agent:              AgentId,
    pub start:              NodeId,
    pub start_time:         Seconds,
    pub orientation:        Angle,
    pub destination:        NodeId,
    pub can_pass_obstacles: bool,
}

// ── Arena ─────────────────────────────────────────────────────────────────────

/// Index of a state in the per-search arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub u32);

impl StateId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Debug)]
enum Action {
    Start,
    Wait,
    /// Turn until `depart`, then drive through `waypoints[first..first+len]`.
    Move { depart: Seconds, first: u32, len: u32 },
}

#[derive(Copy, Clone, Debug)]
struct State {
    node:        NodeId,
    time:        Seconds,
    orientation: Angle,
    parent:      Option<StateId>,
    g:           Seconds,
    action:      Action,
}

#[derive(Default)]
struct Arena {
    states:      Vec<State>,
    /// `(node, arrival time)` of every move prefix, back to back.
    waypoints:   Vec<(NodeId, Seconds)>,
    /// Latest arrival generated per node in this search.
    best_arrival: FxHashMap<NodeId, Seconds>,
    /// Move successors dropped by tie-breaking.
    pruned:      usize,
    /// `(node, heading, arrival in ms)` of every generated state.
    seen:        FxHashSet<(NodeId, Angle, i64)>,
    // Hop extension scratch.
    hop_nodes:   Vec<NodeId>,
    hop_dist:    Vec<f64>,
    hop_times:   Vec<Seconds>,
}

impl Arena {
    fn clear(&mut self) {
        self.states.clear();
        self.waypoints.clear();
        self.best_arrival.clear();
        self.seen.clear();
        self.pruned = 0;
    }

    #[inline]
    fn get(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }
}

#[inline]
fn millis(t: Seconds) -> i64 {
    (t * 1000.0).round() as i64
}

// ── WindowedSearch ────────────────────────────────────────────────────────────

/// Reusable WHCA* planner.  The arena and search sets are cleared at the
/// start of every call; nothing carries over between calls.
pub struct WindowedSearch {
    config:          WhcaConfig,
    arena:           Arena,
    frontier:        BestFirst<StateId>,
    last_expansions: usize,
}

impl WindowedSearch {
    pub fn new(config: WhcaConfig) -> SearchResult<Self> {
        config.validate()?;
        Ok(Self { config, arena: Arena::default(), frontier: BestFirst::new(), last_expansions: 0 })
    }

    pub fn config(&self) -> &WhcaConfig {
        &self.config
    }

    /// Swap the tuning for subsequent calls.
    pub fn set_config(&mut self, config: WhcaConfig) -> SearchResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Expansions performed by the most recent [`plan`](Self::plan) call.
    pub fn last_expansions(&self) -> usize {
        self.last_expansions
    }

    /// States generated by the most recent call.
    pub fn last_state_count(&self) -> usize {
        self.arena.states.len()
    }

    /// Move successors the most recent call dropped by tie-breaking.
    pub fn last_pruned(&self) -> usize {
        self.arena.pruned
    }

    /// Plan `query` against the committed claims in `table`.
    ///
    /// Reads the table only; committing the returned intervals is the
    /// caller's job, and must happen before any other claim is added.
    pub fn plan(
        &mut self,
        graph: &Graph,
        physics: &Physics,
        table: &ReservationTable,
        rra: &mut ReverseResumable,
        query: &Query,
    ) -> SearchResult<PlanOutcome> {
        graph.check_node(query.start)?;
        graph.check_node(query.destination)?;
        if rra.destination() != query.destination {
            return Err(SearchError::HeuristicMismatch {
                heuristic: rra.destination(),
                requested: query.destination,
            });
        }

        self.last_expansions = 0;
        self.arena.pruned = 0;
        if query.start == query.destination {
            return Ok(PlanOutcome::Found(Plan::stay(query.start, query.start_time, query.orientation)));
        }

        self.arena.clear();
        self.frontier.clear();
        self.arena.states.push(State {
            node:        query.start,
            time:        query.start_time,
            orientation: query.orientation,
            parent:      None,
            g:           0.0,
            action:      Action::Start,
        });
        self.arena.seen.insert((query.start, query.orientation, millis(query.start_time)));
        self.arena.best_arrival.insert(query.start, query.start_time);
        let root = StateId(0);

        let mut problem = Windowed {
            graph,
            physics,
            table,
            rra,
            query,
            config: &self.config,
            window_end: query.start_time + self.config.window,
            arena: &mut self.arena,
        };
        self.frontier.seed(&mut problem, root);
        let status = self.frontier.run(&mut problem, Some(self.config.max_expansions));
        self.last_expansions = self.frontier.expansions();

        let outcome = match status {
            SearchStatus::Found(end) => {
                let plan = self.extract(query, end)?;
                if plan.end_node == query.destination {
                    PlanOutcome::Found(plan)
                } else {
                    PlanOutcome::WindowExceeded(plan)
                }
            }
            SearchStatus::Exhausted | SearchStatus::LimitReached => PlanOutcome::Infeasible,
        };
        debug!(
            agent = %query.agent,
            from = %query.start,
            to = %query.destination,
            outcome = outcome.label(),
            expansions = self.last_expansions,
            states = self.arena.states.len(),
            pruned = self.arena.pruned,
            "windowed search finished"
        );
        Ok(outcome)
    }

    /// Walk backpointers from `end` and rebuild path and claims front to back.
    fn extract(&self, query: &Query, end: StateId) -> SearchResult<Plan> {
        let mut chain = Vec::new();
        let mut cur = Some(end);
        while let Some(id) = cur {
            chain.push(id);
            cur = self.arena.get(id).parent;
        }
        chain.reverse();

        let mut path = Path::new();
        let mut intervals: Vec<Interval> = Vec::new();
        let mut nodes = Vec::new();
        let mut times = Vec::new();

        for pair in chain.windows(2) {
            let from = self.arena.get(pair[0]);
            let to = self.arena.get(pair[1]);
            match to.action {
                Action::Start => {}
                Action::Wait => {
                    path.add_wait(to.node, to.time - from.time);
                    intervals.push(Interval::new(to.node, from.time, to.time));
                }
                Action::Move { depart, first, len } => {
                    let hop = &self.arena.waypoints[first as usize..(first + len) as usize];
                    nodes.clear();
                    times.clear();
                    nodes.push(from.node);
                    times.push(depart);
                    for (i, &(node, time)) in hop.iter().enumerate() {
                        nodes.push(node);
                        times.push(time);
                        if i + 1 == hop.len() {
                            path.push_stop(node);
                        } else {
                            path.push_waypoint(node);
                        }
                    }
                    intervals.extend(build_intervals(from.time, &nodes, &times, false)?);
                }
            }
        }

        let last = self.arena.get(end);
        if self.config.final_reservation {
            intervals.push(Interval::permanent(last.node, last.time));
        }
        coalesce(&mut intervals);

        Ok(Plan {
            path,
            intervals,
            start_time: query.start_time,
            end_time: last.time,
            end_node: last.node,
            end_orientation: last.orientation,
        })
    }
}

// ── Space-time problem ────────────────────────────────────────────────────────

struct Windowed<'a> {
    graph:      &'a Graph,
    physics:    &'a Physics,
    table:      &'a ReservationTable,
    rra:        &'a mut ReverseResumable,
    query:      &'a Query,
    config:     &'a WhcaConfig,
    window_end: Seconds,
    arena:      &'a mut Arena,
}

impl Windowed<'_> {
    /// Locked nodes, obstacles without permission, and the heuristic's
    /// custom blocked set are off limits, except the destination.
    fn enterable(&self, node: NodeId) -> bool {
        node == self.query.destination
            || !(self.graph.is_blocked(node, self.query.can_pass_obstacles) || self.rra.blocked().contains(&node))
    }

    /// Append a state unless it duplicates one already generated or, for a
    /// move, fails to arrive strictly later than the node's best arrival.
    fn push_state(
        &mut self,
        node: NodeId,
        time: Seconds,
        orientation: Angle,
        parent: StateId,
        action: Action,
    ) -> Option<StateId> {
        if !self.arena.seen.insert((node, orientation, millis(time))) {
            return None;
        }
        if self.config.tie_breaking && matches!(action, Action::Move { .. }) {
            let best = self.arena.best_arrival.entry(node).or_insert(f64::NEG_INFINITY);
            if time <= *best + TIME_EPSILON {
                self.arena.pruned += 1;
                return None;
            }
            *best = time;
        }
        let id = StateId(self.arena.states.len() as u32);
        self.arena.states.push(State {
            node,
            time,
            orientation,
            parent: Some(parent),
            g: f64::INFINITY,
            action,
        });
        Some(id)
    }

    /// Generate the move successors of `parent` heading `angle`, leaving at
    /// `depart` after the turn.
    fn extend_hop(&mut self, parent: StateId, angle: Angle, depart: Seconds, out: &mut Vec<StateId>) {
        let State { node: origin, time, .. } = *self.arena.get(parent);
        let mut hop_nodes = std::mem::take(&mut self.arena.hop_nodes);
        let mut hop_dist = std::mem::take(&mut self.arena.hop_dist);
        let mut hop_times = std::mem::take(&mut self.arena.hop_times);
        hop_nodes.clear();
        hop_dist.clear();
        hop_nodes.push(origin);

        let mut cur = origin;
        let mut covered = 0.0;
        while hop_nodes.len() <= self.graph.node_count() {
            let Some(e) = self.graph.next_in_direction(cur, angle) else { break };
            let next = self.graph.edge_to[e.index()];
            if !self.enterable(next) {
                break;
            }
            covered += self.graph.edge_distance[e.index()];
            hop_nodes.push(next);
            hop_dist.push(covered);

            hop_times.clear();
            hop_times.push(depart);
            hop_times.extend(self.physics.checkpoint_times(0.0, &hop_dist).into_iter().map(|dt| depart + dt));

            let Ok(claims) = build_intervals(time, &hop_nodes, &hop_times, false) else { break };
            if !claims.iter().all(|c| self.table.is_free(c.node, c.start, c.end)) {
                break;
            }

            let arrival = hop_times[hop_times.len() - 1];
            let first = self.arena.waypoints.len() as u32;
            self.arena.waypoints.extend(hop_nodes[1..].iter().copied().zip(hop_times[1..].iter().copied()));
            let len = (hop_nodes.len() - 1) as u32;
            if let Some(id) = self.push_state(next, arrival, angle, parent, Action::Move { depart, first, len }) {
                out.push(id);
            }
            if arrival > self.window_end {
                break;
            }
            cur = next;
        }

        self.arena.hop_nodes = hop_nodes;
        self.arena.hop_dist = hop_dist;
        self.arena.hop_times = hop_times;
    }
}

impl SearchProblem for Windowed<'_> {
    type Node = StateId;

    fn h(&mut self, id: StateId) -> f64 {
        let s = *self.arena.get(id);
        self.rra.heuristic(self.graph, s.node, s.orientation)
    }

    fn g(&self, id: StateId) -> f64 {
        self.arena.get(id).g
    }

    fn g_prime(&mut self, _parent: StateId, id: StateId) -> f64 {
        self.arena.get(id).time - self.query.start_time
    }

    fn successors(&mut self, id: StateId, out: &mut Vec<StateId>) {
        let State { node, time, orientation, .. } = *self.arena.get(id);

        let until = time + self.config.wait_step;
        if self.table.is_free(node, time, until) {
            if let Some(w) = self.push_state(node, until, orientation, id, Action::Wait) {
                out.push(w);
            }
        }
        if time >= self.window_end {
            return;
        }

        let graph = self.graph;
        let mut tried: Vec<Angle> = Vec::with_capacity(8);
        for e in graph.out_edges(node) {
            let angle = graph.edge_angle[e.index()];
            if tried.contains(&angle) {
                continue;
            }
            tried.push(angle);

            let depart = time + self.physics.time_to_turn(orientation, angle);
            if depart > time && !self.table.is_free(node, time, depart) {
                continue;
            }
            self.extend_hop(id, angle, depart, out);
        }
    }

    fn set_backpointer(&mut self, _parent: StateId, id: StateId, g: f64, _h: f64) {
        self.arena.states[id.index()].g = g;
    }

    fn stop_condition(&mut self, id: StateId) -> bool {
        let s = *self.arena.get(id);
        let terminal = s.node == self.query.destination || s.time > self.window_end;
        terminal && (!self.config.final_reservation || self.table.is_free_forever(s.node, s.time))
    }
}
