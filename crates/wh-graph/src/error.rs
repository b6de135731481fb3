//! Graph error type.

use thiserror::Error;

use wh_core::NodeId;

/// Errors produced by `wh-graph`.  All of them are caller mistakes at build
/// or flag-toggle time; routing failures are reported by the searches.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node {0} not found in graph")]
    NodeNotFound(NodeId),

    #[error("edge {0} → {0} is a self-loop")]
    SelfLoop(NodeId),

    #[error("regular edge {from} → {to} crosses tiers; use an elevator edge")]
    CrossTierEdge { from: NodeId, to: NodeId },

    #[error("elevator edge {from} → {to} has invalid travel time {value}")]
    InvalidTravelTime { from: NodeId, to: NodeId, value: f64 },
}

pub type GraphResult<T> = Result<T, GraphError>;
