//! `wh-core` — foundational types for the `rust_wh` warehouse fleet planner.
//!
//! This crate is a dependency of every other `wh-*` crate.  It has no `wh-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `NodeId`, `EdgeId`, `ElevatorId`, `TierId` |
//! | [`geo`]         | `Point2`, compass-quantized `Angle`                   |
//! | [`time`]        | `Seconds`, time tolerances                            |
//! | [`physics`]     | `KinematicProfile`, `Physics` timing model            |
//! | [`rng`]         | `AgentRng` (per-agent deterministic RNG)              |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod geo;
pub mod ids;
pub mod physics;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use geo::{Angle, Point2};
pub use ids::{AgentId, EdgeId, ElevatorId, NodeId, TierId};
pub use physics::{KinematicProfile, Physics};
pub use rng::AgentRng;
pub use time::{COALESCE_GAP, Seconds, TIME_EPSILON};
