//! `wh-sim` — discrete-event driver for the fleet planner.
//!
//! # Event loop
//!
//! ```text
//! while the next event time < config.horizon:
//!   ① Pop   — take every robot due at that time (ascending AgentId).
//!   ② Arrive — the robot is now where its last plan ended.
//!   ③ Task  — at its destination (or without one), ask the
//!             DestinationPolicy for the next one.
//!   ④ Plan  — board an elevator if standing at the boarding node of a
//!             cross-tier route, otherwise plan and commit the next window.
//!   ⑤ Push  — schedule the robot at its plan's end time, or after
//!             `retry_delay` when nothing could be planned.
//! ```
//!
//! Robots planned earlier in the same slot have priority over later ones.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! let agents = (0..4).map(|i| Agent::new(AgentId(i), profile)).collect::<Result<_, _>>()?;
//! let mut sim = SimBuilder::new(config, graph, RandomNodes::new(shelves), agents)
//!     .initial_positions(docks)
//!     .build()?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod observer;
pub mod policy;
pub mod sim;


pub use builder::SimBuilder;
pub use config::SimConfig;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use policy::{DestinationPolicy, RandomNodes, Stay, Tour};
pub use sim::{Sim, SimStats};
