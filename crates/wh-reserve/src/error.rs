//! Reservation error type.

use thiserror::Error;

use wh_core::{AgentId, NodeId, Seconds};

#[derive(Debug, Error)]
pub enum ReservationError {
    /// A proposed claim collides with a committed one.  Planners never
    /// produce this; seeing it means the query-then-commit discipline was
    /// broken.
    #[error(
        "claim on {node} [{start:.3}, {end:.3}] overlaps [{held_start:.3}, {held_end:.3}] held by {holder}"
    )]
    Overlap {
        node:       NodeId,
        start:      Seconds,
        end:        Seconds,
        held_start: Seconds,
        held_end:   Seconds,
        holder:     AgentId,
    },

    #[error("timed node sequence has {nodes} nodes but {times} times")]
    LengthMismatch { nodes: usize, times: usize },
}

pub type ReservationResult<T> = Result<T, ReservationError>;
