//! Spatial-subsystem error type.

use thiserror::Error;

use ts_core::{MapId, NodeId};

#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("map {0} not found")]
    MapNotFound(MapId),

    #[error("node {0} not found on map {1}")]
    NodeNotFound(NodeId, MapId),

    #[error("no route from {from} to {to} on map {map}")]
    NoRoute { map: MapId, from: NodeId, to: NodeId },

    #[error("no entrance route from ({from_map}, {from_node}) to ({to_map}, {to_node})")]
    NoEntranceRoute {
        from_map: MapId,
        from_node: NodeId,
        to_map: MapId,
        to_node: NodeId,
    },

    #[error("map {0}: leadsTo symmetry invariant violated")]
    AsymmetricLeadsTo(MapId),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
