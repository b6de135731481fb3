//! The fleet planner: owns the reservation table and one reverse heuristic
//! search per robot, and turns planning requests into committed claims.

use std::collections::hash_map::Entry;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace, warn};

use wh_core::{AgentId, Angle, NodeId, Seconds};
use wh_graph::Graph;
use wh_reserve::{Interval, ReservationTable};
use wh_search::{
    ElevatorLeg, ElevatorRoute, Path, Plan, PlanOutcome, Query, ReverseResumable,
    StaticRoute, WhcaConfig, WindowedSearch, elevator_route, shortest_route,
};

use crate::{Agent, FleetError, FleetResult};

// ── Config ────────────────────────────────────────────────────────────────────

/// Planner tuning.  Field meanings match [`WhcaConfig`]; `window` can be
/// overridden per robot with [`Agent::window`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlannerConfig {
    pub window:            Seconds,
    pub wait_step:         Seconds,
    pub tie_breaking:      bool,
    pub final_reservation: bool,
    pub max_expansions:    usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        let search = WhcaConfig::default();
        Self {
            window:            search.window,
            wait_step:         search.wait_step,
            tie_breaking:      search.tie_breaking,
            final_reservation: search.final_reservation,
            max_expansions:    search.max_expansions,
        }
    }
}

impl PlannerConfig {
    /// Search settings for one robot.
    pub fn search(&self, window: Option<Seconds>) -> WhcaConfig {
        WhcaConfig {
            window:            window.unwrap_or(self.window),
            wait_step:         self.wait_step,
            tie_breaking:      self.tie_breaking,
            final_reservation: self.final_reservation,
            max_expansions:    self.max_expansions,
        }
    }
}

/// Running counters, for logs and the end-of-run summary.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlannerStats {
    pub plans:            u64,
    pub found:            u64,
    pub window_exceeded:  u64,
    pub infeasible:       u64,
    pub heuristic_builds: u64,
    pub expansions:       u64,
}

impl PlannerStats {
    fn record(&mut self, outcome: &PlanOutcome) {
        self.plans += 1;
        match outcome {
            PlanOutcome::Found(_) => self.found += 1,
            PlanOutcome::WindowExceeded(_) => self.window_exceeded += 1,
            PlanOutcome::Infeasible => self.infeasible += 1,
        }
    }
}

/// Result of [`FleetPlanner::plan_across_tiers`].
#[derive(Clone, Debug, PartialEq)]
pub struct CrossTierPlan {
    /// The reservation-free route across all tiers.
    pub route:   ElevatorRoute,
    /// The committed windowed plan toward the first boarding node (or the
    /// destination when no elevator is needed).
    pub outcome: PlanOutcome,
}

// ── FleetPlanner ──────────────────────────────────────────────────────────────

pub struct FleetPlanner {
    config:         PlannerConfig,
    reservations:   ReservationTable,
    search:         WindowedSearch,
    heuristics:     FxHashMap<AgentId, ReverseResumable>,
    custom_blocked: FxHashMap<AgentId, FxHashSet<NodeId>>,
    stats:          PlannerStats,
}

impl FleetPlanner {
    pub fn new(config: PlannerConfig) -> FleetResult<Self> {
        let search = WindowedSearch::new(config.search(None))?;
        Ok(Self {
            config,
            reservations: ReservationTable::new(),
            search,
            heuristics: FxHashMap::default(),
            custom_blocked: FxHashMap::default(),
            stats: PlannerStats::default(),
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn reservations(&self) -> &ReservationTable {
        &self.reservations
    }

    pub fn stats(&self) -> &PlannerStats {
        &self.stats
    }

    /// The cached reverse search of `agent`, if one has been built.
    pub fn heuristic(&self, agent: AgentId) -> Option<&ReverseResumable> {
        self.heuristics.get(&agent)
    }

    // ── Placement ─────────────────────────────────────────────────────────

    /// Put `agent` at rest on `node` from `time` and claim the node for good.
    ///
    /// Any claims the robot held before are dropped.  If `node` is held by
    /// another robot at `time` the placement fails and the robot is left
    /// unplaced.
    pub fn place(
        &mut self,
        graph: &Graph,
        agent: &mut Agent,
        node: NodeId,
        time: Seconds,
        orientation: Angle,
    ) -> FleetResult<()> {
        graph.check_node(node)?;
        self.reservations.release_all(agent.id);
        if let Err(err) = self.reservations.try_commit(agent.id, &[Interval::permanent(node, time)]) {
            agent.rest(NodeId::INVALID, time, orientation);
            return Err(err.into());
        }
        agent.rest(node, time, orientation);
        debug!(agent = %agent.id, %node, time, "placed");
        Ok(())
    }

    /// Drop every claim and cached search of `agent`.
    pub fn forget(&mut self, agent: AgentId) -> usize {
        self.heuristics.remove(&agent);
        self.custom_blocked.remove(&agent);
        self.reservations.release_all(agent)
    }

    /// Drop claims that ended before `time`.
    pub fn prune_before(&mut self, time: Seconds) -> usize {
        self.reservations.prune_before(time)
    }

    // ── Heuristic control ─────────────────────────────────────────────────

    /// Nodes `agent` must route around in addition to locked ones.  The
    /// robot's cached heuristic is discarded.
    pub fn set_custom_blocked(&mut self, agent: AgentId, blocked: FxHashSet<NodeId>) {
        self.heuristics.remove(&agent);
        if blocked.is_empty() {
            self.custom_blocked.remove(&agent);
        } else {
            self.custom_blocked.insert(agent, blocked);
        }
    }

    /// Reuse the cached reverse search of `agent` or build a new one.
    ///
    /// Takes the maps rather than `&mut self` so the caller can keep
    /// borrowing the table and the windowed search alongside.
    fn heuristic_for<'h>(
        heuristics: &'h mut FxHashMap<AgentId, ReverseResumable>,
        custom_blocked: &FxHashMap<AgentId, FxHashSet<NodeId>>,
        stats: &mut PlannerStats,
        graph: &Graph,
        agent: &Agent,
        destination: NodeId,
    ) -> FleetResult<&'h mut ReverseResumable> {
        let origin = agent.next_node;
        let can_pass = agent.can_go_through_obstacles;
        let build = || {
            let blocked = custom_blocked.get(&agent.id).cloned().unwrap_or_default();
            ReverseResumable::new(graph, *agent.physics(), destination, origin, can_pass, blocked)
        };
        // The origin is always admissible to the search it was built for, so a
        // blocked origin of a new plan needs its own search.
        let reusable = |rra: &ReverseResumable| {
            rra.destination() == destination
                && !rra.is_stale(graph)
                && rra.can_pass_obstacles() == can_pass
                && rra.physics() == agent.physics()
                && (rra.origin() == origin
                    || !(graph.is_blocked(origin, can_pass) || rra.blocked().contains(&origin)))
        };

        let rra = match heuristics.entry(agent.id) {
            Entry::Occupied(mut slot) => {
                if !reusable(slot.get()) {
                    slot.insert(build()?);
                    stats.heuristic_builds += 1;
                    trace!(agent = %agent.id, %destination, "rebuilt heuristic");
                }
                slot.into_mut()
            }
            Entry::Vacant(slot) => {
                stats.heuristic_builds += 1;
                trace!(agent = %agent.id, %destination, "built heuristic");
                slot.insert(build()?)
            }
        };
        Ok(rra)
    }

    // ── Planning ──────────────────────────────────────────────────────────

    /// Plan `agent` toward its destination and commit the result.
    ///
    /// Routes that change tier go through [`plan_across_tiers`]
    /// (Self::plan_across_tiers) and stop at the first boarding node.  On
    /// success the robot is set to follow the plan.  On `Infeasible` it keeps
    /// a rest claim where it stands.
    pub fn plan(&mut self, graph: &Graph, agent: &mut Agent) -> FleetResult<PlanOutcome> {
        if !agent.is_placed() {
            return Err(FleetError::NotPlaced(agent.id));
        }
        graph.check_node(agent.destination)?;
        if graph.tier(agent.next_node) != graph.tier(agent.destination) {
            return match self.plan_across_tiers(graph, agent)? {
                Some(cross) => Ok(cross.outcome),
                None => {
                    let outcome = PlanOutcome::Infeasible;
                    self.stats.record(&outcome);
                    debug!(agent = %agent.id, destination = %agent.destination, "no route across tiers");
                    Ok(outcome)
                }
            };
        }
        let destination = agent.destination;
        self.plan_to(graph, agent, destination)
    }

    fn plan_to(&mut self, graph: &Graph, agent: &mut Agent, target: NodeId) -> FleetResult<PlanOutcome> {
        let start = agent.next_node;
        let start_time = agent.arrival_time;
        if start == target {
            self.settle(agent);
            let outcome = PlanOutcome::Found(Plan::stay(start, start_time, agent.orientation));
            self.stats.record(&outcome);
            return Ok(outcome);
        }

        let released = self.reservations.release_after(agent.id, start_time);
        let config = self.config.search(agent.window);
        if *self.search.config() != config {
            self.search.set_config(config)?;
        }
        let rra = match Self::heuristic_for(
            &mut self.heuristics,
            &self.custom_blocked,
            &mut self.stats,
            graph,
            agent,
            target,
        ) {
            Ok(rra) => rra,
            Err(err) => {
                self.hold(agent.id, start, start_time);
                return Err(err);
            }
        };
        let query = Query {
            agent: agent.id,
            start,
            start_time,
            orientation: agent.orientation,
            destination: target,
            can_pass_obstacles: agent.can_go_through_obstacles,
        };
        let outcome = match self.search.plan(graph, agent.physics(), &self.reservations, rra, &query) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.hold(agent.id, start, start_time);
                return Err(err.into());
            }
        };
        self.stats.expansions += self.search.last_expansions() as u64;

        match &outcome {
            PlanOutcome::Found(plan) | PlanOutcome::WindowExceeded(plan) => {
                self.reservations.commit(agent.id, &plan.intervals);
                agent.follow(plan);
            }
            PlanOutcome::Infeasible => self.hold(agent.id, start, start_time),
        }
        self.stats.record(&outcome);
        debug!(
            agent = %agent.id,
            from = %start,
            to = %target,
            released,
            expansions = self.search.last_expansions(),
            outcome = outcome.label(),
            "planned"
        );
        Ok(outcome)
    }

    /// Claim the node `agent` rests on from its arrival onwards, unless the
    /// robot already holds it.  Plans committed without a final reservation
    /// leave a parked robot unclaimed until this runs.
    pub fn settle(&mut self, agent: &Agent) -> bool {
        if !agent.is_placed() {
            return false;
        }
        let (node, time) = (agent.next_node, agent.arrival_time);
        match self.reservations.conflict(node, time, f64::INFINITY) {
            None => {
                self.hold(agent.id, node, time);
                trace!(agent = %agent.id, %node, time, "settled");
                true
            }
            Some((_, holder)) if holder == agent.id => false,
            Some((held, holder)) => {
                warn!(agent = %agent.id, %node, %holder, held = %held, "parked on a node claimed by another robot");
                false
            }
        }
    }

    /// Keep a resting robot visible to everyone planned after it.
    fn hold(&mut self, agent: AgentId, node: NodeId, time: Seconds) {
        if let Err(err) = self.reservations.try_commit(agent, &[Interval::permanent(node, time)]) {
            warn!(%agent, %node, %err, "cannot hold position");
        }
    }

    /// Fastest route for `agent` ignoring other robots.  Commits nothing.
    pub fn plan_static(&self, graph: &Graph, agent: &Agent) -> FleetResult<Option<StaticRoute>> {
        if !agent.is_placed() {
            return Err(FleetError::NotPlaced(agent.id));
        }
        let route = shortest_route(
            graph,
            agent.physics(),
            agent.next_node,
            agent.destination,
            Some(agent.orientation),
            agent.can_go_through_obstacles,
        )?;
        Ok(route)
    }

    /// Sequence the elevators toward `agent`'s destination, then plan and
    /// commit the first leg: up to the first boarding node, or all the way
    /// when the route needs no elevator.  `Ok(None)` if the destination cannot
    /// be reached at all.
    pub fn plan_across_tiers(
        &mut self,
        graph: &Graph,
        agent: &mut Agent,
    ) -> FleetResult<Option<CrossTierPlan>> {
        if !agent.is_placed() {
            return Err(FleetError::NotPlaced(agent.id));
        }
        let Some(route) = elevator_route(
            graph,
            agent.physics(),
            agent.next_node,
            agent.destination,
            agent.can_go_through_obstacles,
        )?
        else {
            return Ok(None);
        };
        let target = route.first_boarding().unwrap_or(agent.destination);
        debug!(agent = %agent.id, legs = route.legs.len(), %target, "cross-tier route");
        let outcome = self.plan_to(graph, agent, target)?;
        Ok(Some(CrossTierPlan { route, outcome }))
    }

    /// Ride `leg` with `agent`, which must be at rest on its boarding node.
    ///
    /// The robot leaves the floor at its arrival time and rests on the exit
    /// node after the ride.  Returns `false` without changing anything if the
    /// exit node is not free from then on.
    pub fn ride(&mut self, graph: &Graph, agent: &mut Agent, leg: &ElevatorLeg) -> FleetResult<bool> {
        if agent.is_in_transit() || agent.next_node != leg.from {
            return Err(FleetError::NotBoarding { agent: agent.id, node: leg.from, elevator: leg.elevator });
        }
        let Some(edge) = graph
            .elevators_from(leg.from)
            .iter()
            .find(|e| e.to == leg.to && e.elevator == leg.elevator)
        else {
            return Err(FleetError::NoSuchElevator { elevator: leg.elevator, from: leg.from, to: leg.to });
        };

        let board = agent.arrival_time;
        let exit = board + edge.time_travel;
        if !self.reservations.is_free_forever(leg.to, exit) {
            return Ok(false);
        }
        self.reservations.release_after(agent.id, board);
        self.reservations.commit(agent.id, &[Interval::permanent(leg.to, exit)]);
        agent.current_node = leg.from;
        agent.next_node = leg.to;
        agent.arrival_time = exit;
        debug!(agent = %agent.id, elevator = %leg.elevator, from = %leg.from, to = %leg.to, exit, "rode elevator");
        Ok(true)
    }

    /// The remaining route from `node` to `agent`'s destination along its
    /// cached heuristic, stopping at every turning point.
    ///
    /// Used to show where a robot is headed past the end of a windowed plan.
    /// Commits nothing.  `None` without a cached heuristic or when the
    /// destination is unreachable from `node`.
    pub fn provisional_tail(&mut self, graph: &Graph, agent: AgentId, node: NodeId) -> Option<Path> {
        let rra = self.heuristics.get_mut(&agent)?;
        if rra.is_stale(graph) {
            return None;
        }
        let route = rra.route_from(graph, node)?;
        Some(Path::from_nodes(graph, &route))
    }
}
