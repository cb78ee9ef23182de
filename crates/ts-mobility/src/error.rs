//! Mobility-subsystem error type.

use thiserror::Error;

use ts_core::{CharacterId, MapId, NodeId};

#[derive(Debug, Error)]
pub enum MobilityError {
    #[error("character {0} not found")]
    CharacterNotFound(CharacterId),

    #[error("character {0} is already moving")]
    AlreadyMoving(CharacterId),

    #[error("map {0} not found")]
    MapNotFound(MapId),

    #[error("node {0} not found on map {1}")]
    NodeNotFound(NodeId, MapId),

    #[error("path index {index} out of bounds for a {len}-node path on map {map}")]
    NoPath { map: MapId, index: usize, len: usize },

    #[error("no cross-map route from ({from_map}, {from_node}) to ({to_map}, {to_node})")]
    NoRoute { from_map: MapId, from_node: NodeId, to_map: MapId, to_node: NodeId },

    #[error(transparent)]
    Spatial(#[from] ts_spatial::SpatialError),

    #[error(transparent)]
    World(#[from] ts_world::WorldError),
}

pub type MobilityResult<T> = Result<T, MobilityError>;
