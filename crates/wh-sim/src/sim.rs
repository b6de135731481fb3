//! The `Sim` struct and its event loop.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use tracing::{debug, info, warn};

use wh_core::{AgentId, AgentRng, NodeId, Seconds, TIME_EPSILON};
use wh_fleet::{Agent, FleetPlanner};
use wh_graph::Graph;
use wh_search::PlanOutcome;

use crate::{DestinationPolicy, SimConfig, SimObserver, SimResult};

/// Run counters.  Planner-side counts live in
/// [`FleetPlanner::stats`](wh_fleet::FleetPlanner::stats).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimStats {
    pub events:          u64,
    pub tasks_completed: u64,
    pub elevator_rides:  u64,
    /// Events that ended with the robot told to try again later.
    pub retries:         u64,
}

/// The simulation runner.  Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<P: DestinationPolicy> {
    pub config: SimConfig,

    /// Floor graph.  Flags may be changed between [`step`](Self::step)
    /// calls; cached heuristics notice on the next plan.
    pub graph: Graph,

    pub planner: FleetPlanner,

    /// Indexed by `AgentId`.
    pub agents: Vec<Agent>,

    /// Per-robot RNGs, kept apart from `agents` for the split borrow with
    /// the policy.
    pub rngs: Vec<AgentRng>,

    pub policy: P,

    /// Robots due at each time.
    pub events: BTreeMap<OrderedFloat<Seconds>, Vec<AgentId>>,

    /// Time of the slot being (or last) processed.
    pub now: Seconds,

    pub(crate) last_prune: Seconds,
    pub(crate) stats:      SimStats,
}

impl<P: DestinationPolicy> Sim<P> {
    // ── Public API ────────────────────────────────────────────────────────

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Time of the next pending event.
    pub fn next_event_time(&self) -> Option<Seconds> {
        self.events.keys().next().map(|t| t.0)
    }

    /// Process events until the queue is empty or the next event is at or
    /// past `config.horizon`.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        info!(agents = self.agents.len(), horizon = self.config.horizon, "simulation start");
        while self.next_event_time().is_some_and(|t| t < self.config.horizon) {
            self.step(observer)?;
        }
        observer.on_sim_end(self.now, &self.stats);
        let planned = self.planner.stats();
        info!(
            time = self.now,
            events = self.stats.events,
            tasks = self.stats.tasks_completed,
            rides = self.stats.elevator_rides,
            plans = planned.plans,
            infeasible = planned.infeasible,
            "simulation end"
        );
        Ok(())
    }

    /// Process the earliest time slot, ignoring the horizon.  Returns the
    /// number of robots handled.
    pub fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<usize> {
        let Some((time, mut due)) = self.events.pop_first() else {
            return Ok(0);
        };
        self.now = time.0;
        self.maybe_prune();

        due.sort_unstable();
        due.dedup();
        for &agent in &due {
            self.stats.events += 1;
            observer.on_event(self.now, agent);
            self.handle(agent, observer)?;
        }
        Ok(due.len())
    }

    // ── Event handling ────────────────────────────────────────────────────

    fn handle<O: SimObserver>(&mut self, id: AgentId, observer: &mut O) -> SimResult<()> {
        let now = self.now;
        let i = id.index();
        let agent = &mut self.agents[i];
        agent.arrive();
        agent.arrival_time = agent.arrival_time.max(now);
        if !self.planner.config().final_reservation {
            self.planner.settle(agent);
        }

        // ── Task bookkeeping ──────────────────────────────────────────────
        if !agent.destination.is_valid() || agent.at_destination() {
            if agent.destination.is_valid() {
                self.stats.tasks_completed += 1;
                observer.on_task_complete(now, id, agent.next_node);
            }
            match self.policy.next_destination(agent, &self.graph, &mut self.rngs[i]) {
                Some(node) if node != agent.next_node => {
                    debug!(agent = %id, %node, "new destination");
                    agent.destination = node;
                }
                _ => {
                    agent.destination = NodeId::INVALID;
                    self.retry(id);
                    return Ok(());
                }
            }
        }

        // ── Plan (or board) ───────────────────────────────────────────────
        let outcome = if self.graph.tier(agent.next_node) != self.graph.tier(agent.destination) {
            match self.planner.plan_across_tiers(&self.graph, agent)? {
                Some(cross) if cross.route.first_boarding() == Some(agent.next_node) => {
                    let leg = cross.route.legs[0];
                    if self.planner.ride(&self.graph, agent, &leg)? {
                        self.stats.elevator_rides += 1;
                        observer.on_elevator(now, id, &leg);
                        let exit = agent.arrival_time;
                        self.schedule(id, exit);
                    } else {
                        self.retry(id);
                    }
                    return Ok(());
                }
                Some(cross) => cross.outcome,
                None => PlanOutcome::Infeasible,
            }
        } else {
            self.planner.plan(&self.graph, agent)?
        };
        observer.on_plan(now, agent, &outcome);

        match outcome.plan() {
            Some(plan) if plan.end_time > now + TIME_EPSILON => self.schedule(id, plan.end_time),
            Some(_) => self.retry(id),
            None => {
                warn!(agent = %id, from = %agent.next_node, to = %agent.destination, "no plan, retrying");
                self.retry(id);
            }
        }
        Ok(())
    }

    fn schedule(&mut self, agent: AgentId, time: Seconds) {
        if time < self.config.horizon {
            self.events.entry(OrderedFloat(time)).or_default().push(agent);
        }
    }

    fn retry(&mut self, agent: AgentId) {
        self.stats.retries += 1;
        self.schedule(agent, self.now + self.config.retry_delay);
    }

    fn maybe_prune(&mut self) {
        let interval = self.config.prune_interval;
        if interval > 0.0 && self.now - self.last_prune >= interval {
            let dropped = self.planner.prune_before(self.now);
            debug!(time = self.now, dropped, "pruned claims");
            self.last_prune = self.now;
        }
    }
}
