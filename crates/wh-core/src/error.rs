//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`.

use thiserror::Error;

use crate::{AgentId, NodeId};

/// Errors produced by `wh-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("kinematic parameter `{field}` must be finite and positive, got {value}")]
    InvalidProfile { field: &'static str, value: f64 },

    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `wh-core`.
pub type CoreResult<T> = Result<T, CoreError>;
