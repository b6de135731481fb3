//! `wh-graph` — the static warehouse floor graph.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                  |
//! |-----------|-----------------------------------------------------------|
//! | [`graph`] | `Graph` (forward + backward CSR, flags), `GraphBuilder`,  |
//! |           | `ElevatorEdge`                                            |
//! | [`error`] | `GraphError`, `GraphResult<T>`                            |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public value types.     |

pub mod error;
pub mod graph;

#[cfg(test)]
mod tests;

pub use error::{GraphError, GraphResult};
pub use graph::{ElevatorEdge, Graph, GraphBuilder};
