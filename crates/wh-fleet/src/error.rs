use thiserror::Error;

use wh_core::{AgentId, CoreError, ElevatorId, NodeId};
use wh_graph::GraphError;
use wh_reserve::ReservationError;
use wh_search::SearchError;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("agent {0} has not been placed on the floor")]
    NotPlaced(AgentId),

    #[error("{agent} is not at rest on {node}, the boarding node of elevator {elevator}")]
    NotBoarding { agent: AgentId, node: NodeId, elevator: ElevatorId },

    #[error("no elevator {elevator} runs {from} → {to}")]
    NoSuchElevator { elevator: ElevatorId, from: NodeId, to: NodeId },

    #[error("zone exit by {0} with no robot inside")]
    ZoneEmpty(AgentId),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("graph: {0}")]
    Graph(#[from] GraphError),

    #[error("reservation: {0}")]
    Reservation(#[from] ReservationError),

    #[error("search: {0}")]
    Search(#[from] SearchError),
}

pub type FleetResult<T> = Result<T, FleetError>;
