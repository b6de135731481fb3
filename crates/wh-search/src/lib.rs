//! `wh-search` — route searches over the warehouse floor.
//!
//! Every search here is an instance of one best-first loop
//! ([`best_first::BestFirst`]) driven by a [`SearchProblem`] implementation.
//!
//! # Crate layout
//!
//! | Module         | Contents                                               |
//! |----------------|--------------------------------------------------------|
//! | [`open_set`]   | `OpenSet`: lazy-deletion min-heap with decrease-key    |
//! | [`best_first`] | `SearchProblem` trait, `BestFirst` loop, `SearchStatus`|
//! | [`rra`]        | `ReverseResumable` backward heuristic search           |
//! | [`whca`]       | `WindowedSearch`: cooperative space-time search        |
//! | [`astar`]      | `shortest_route`: reservation-free forward A*          |
//! | [`elevator`]   | `elevator_route`: cross-tier sequencing                |
//! | [`path`]       | `Path`, `PathStop`, `Plan`, `PlanOutcome`              |
//! | [`error`]      | `SearchError`, `SearchResult<T>`                       |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on result and config types.|

pub mod astar;
pub mod best_first;
pub mod elevator;
pub mod error;
pub mod open_set;
pub mod path;
pub mod rra;
pub mod whca;

mod hop;

#[cfg(test)]
mod tests;

pub use astar::{StaticRoute, shortest_route};
pub use best_first::{BestFirst, SearchProblem, SearchStatus};
pub use elevator::{ElevatorLeg, ElevatorRoute, elevator_route};
pub use error::{SearchError, SearchResult};
pub use open_set::OpenSet;
pub use path::{Path, PathStop, Plan, PlanOutcome};
pub use rra::ReverseResumable;
pub use whca::{Query, StateId, WhcaConfig, WindowedSearch};
