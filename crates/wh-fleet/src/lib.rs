//! `wh-fleet` — agents and the planner that serves them.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`agent`]   | `Agent`: per-robot planning state                           |
//! | [`planner`] | `FleetPlanner`: reservation table, heuristic cache, commit  |
//! | [`zone`]    | `ZoneGate`: bounded occupancy counter for narrow areas      |
//! | [`error`]   | `FleetError`, `FleetResult<T>`                              |
//!
//! # Planning model
//!
//! Robots are planned one at a time.  Each call to
//! [`FleetPlanner::plan`](planner::FleetPlanner::plan):
//!
//! 1. releases the robot's own claims from its planning time onward,
//! 2. reuses or rebuilds the robot's reverse heuristic search,
//! 3. runs the windowed search against everyone else's claims,
//! 4. commits the claims of the returned plan.
//!
//! Whoever plans first is served first; later robots route around the
//! committed claims.

pub mod agent;
pub mod error;
pub mod planner;
pub mod zone;


pub use agent::Agent;
pub use error::{FleetError, FleetResult};
pub use planner::{CrossTierPlan, FleetPlanner, PlannerConfig, PlannerStats};
pub use zone::ZoneGate;
