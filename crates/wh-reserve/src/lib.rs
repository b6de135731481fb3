//! `wh-reserve` — the space-time reservation ledger.
//!
//! The [`ReservationTable`] is the single source of truth for
//! collision-freedom: every committed plan leaves its occupancy claims here,
//! and every later search treats them as hard constraints.  Planning order
//! therefore encodes priority (first planned, first served).
//!
//! # Crate layout
//!
//! | Module       | Contents                                          |
//! |--------------|---------------------------------------------------|
//! | [`interval`] | `Interval`, interval construction and coalescing  |
//! | [`table`]    | `ReservationTable`                                |
//! | [`error`]    | `ReservationError`, `ReservationResult<T>`        |
//!
//! # Invariant
//!
//! For every node, no two committed intervals overlap in time.  Intervals
//! that touch within [`wh_core::TIME_EPSILON`] do not overlap.

pub mod error;
pub mod interval;
pub mod table;


pub use error::{ReservationError, ReservationResult};
pub use interval::{Interval, build_intervals, coalesce};
pub use table::ReservationTable;
