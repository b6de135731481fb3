//! Search error type.
//!
//! Failing to find a route is not an error; see [`crate::PlanOutcome`].
//! These variants report caller mistakes.

use thiserror::Error;

use wh_core::NodeId;
use wh_graph::GraphError;
use wh_reserve::ReservationError;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Reservation(#[from] ReservationError),

    /// The reverse heuristic handed to a forward search was built for another
    /// destination.
    #[error("heuristic is rooted at {heuristic} but the request targets {requested}")]
    HeuristicMismatch { heuristic: NodeId, requested: NodeId },

    #[error("wait step must be positive and finite, got {0}")]
    InvalidWaitStep(f64),

    #[error("window must be non-negative, got {0}")]
    InvalidWindow(f64),
}

pub type SearchResult<T> = Result<T, SearchError>;
