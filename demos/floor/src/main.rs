//! `floor` — a shift of pick-and-place traffic on a two-tier warehouse floor.
//!
//! Robots start at the tier-0 docks and are sent to random shelf slots on
//! either tier.  Trips to the other tier go through one of the two
//! elevators.  Half the fleet is low-profile and may drive under low
//! shelves; the rest must route around them.
//!
//! Run with:
//!   cargo run -p floor --release
//!   cargo run -p floor --release -- path/to/config.json
//!
//! The optional JSON file is a `SimConfig`; missing fields keep their
//! defaults.  Set `RUST_LOG=debug` for per-plan logging.

mod floor;

use std::fs::File;
use std::io::BufReader;
use std::time::Instant;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wh_core::{AgentId, Angle, KinematicProfile, NodeId, Seconds};
use wh_fleet::Agent;
use wh_search::{ElevatorLeg, PlanOutcome};
use wh_sim::{RandomNodes, SimBuilder, SimConfig, SimObserver, SimStats};

use floor::{HEIGHT, TIERS, WIDTH, build_floor};

// ── Constants ─────────────────────────────────────────────────────────────────

const ROBOT_COUNT: usize = 6;
const HORIZON:     Seconds = 1_800.0;
/// Print a progress line every N simulated seconds.
const REPORT_EVERY: Seconds = 300.0;

// ── Observer ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct ShiftReport {
    deliveries:   Vec<u64>,
    window_hits:  u64,
    stuck:        u64,
    next_report:  Seconds,
    started:      Option<Instant>,
}

impl ShiftReport {
    fn new(robots: usize) -> Self {
        Self { deliveries: vec![0; robots], next_report: REPORT_EVERY, ..Self::default() }
    }
}

impl SimObserver for ShiftReport {
    fn on_event(&mut self, time: Seconds, _agent: AgentId) {
        self.started.get_or_insert_with(Instant::now);
        if time >= self.next_report {
            let done: u64 = self.deliveries.iter().sum();
            println!("t={time:>7.1}s  deliveries={done:>4}  window_hits={:>4}  stuck={:>4}", self.window_hits, self.stuck);
            self.next_report += REPORT_EVERY;
        }
    }

    fn on_task_complete(&mut self, _time: Seconds, agent: AgentId, _node: NodeId) {
        self.deliveries[agent.index()] += 1;
    }

    fn on_plan(&mut self, _time: Seconds, _agent: &Agent, outcome: &PlanOutcome) {
        match outcome {
            PlanOutcome::Found(_) => {}
            PlanOutcome::WindowExceeded(_) => self.window_hits += 1,
            PlanOutcome::Infeasible => self.stuck += 1,
        }
    }

    fn on_elevator(&mut self, time: Seconds, agent: AgentId, leg: &ElevatorLeg) {
        println!("t={time:>7.1}s  {agent} boards elevator {} at {}", leg.elevator.0, leg.from);
    }

    fn on_sim_end(&mut self, time: Seconds, stats: &SimStats) {
        let wall = self.started.map(|t| t.elapsed().as_secs_f64()).unwrap_or(0.0);
        println!();
        println!("Shift over at t={time:.1}s ({wall:.3}s wall)");
        println!(
            "  events={}  deliveries={}  rides={}  retries={}",
            stats.events, stats.tasks_completed, stats.elevator_rides, stats.retries
        );
        for (i, n) in self.deliveries.iter().enumerate() {
            println!("  robot {i:>2}: {n} deliveries");
        }
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn load_config() -> Result<SimConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(SimConfig { horizon: HORIZON, ..SimConfig::default() });
    };
    let file = File::open(&path).with_context(|| format!("opening {path}"))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("parsing {path}"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    let mut layout_rng = SmallRng::seed_from_u64(config.seed);
    let floor = build_floor(&mut layout_rng)?;
    info!(
        nodes = floor.graph.node_count(),
        edges = floor.graph.edge_count(),
        tiers = TIERS,
        width = WIDTH,
        height = HEIGHT,
        "floor built"
    );
    anyhow::ensure!(ROBOT_COUNT <= floor.docks.len(), "more robots than docks");

    let mut agents = Vec::with_capacity(ROBOT_COUNT);
    for i in 0..ROBOT_COUNT {
        let mut agent = Agent::new(AgentId(i as u32), KinematicProfile::default())?;
        agent.can_go_through_obstacles = i % 2 == 0;
        agents.push(agent);
    }
    let positions = floor.docks[..ROBOT_COUNT].to_vec();
    let orientations = vec![Angle::from_degrees(90.0); ROBOT_COUNT];

    let mut sim = SimBuilder::new(config, floor.graph, RandomNodes::new(floor.shelves), agents)
        .initial_positions(positions)
        .initial_orientations(orientations)
        .build()?;

    let mut report = ShiftReport::new(ROBOT_COUNT);
    sim.run(&mut report)?;

    sim.planner.reservations().validate().context("reservation table inconsistent after run")?;
    let planned = sim.planner.stats();
    println!(
        "  plans={}  found={}  window_exceeded={}  infeasible={}  heuristic_builds={}  expansions={}",
        planned.plans,
        planned.found,
        planned.window_exceeded,
        planned.infeasible,
        planned.heuristic_builds,
        planned.expansions
    );
    Ok(())
}
