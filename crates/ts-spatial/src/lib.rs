//! `ts-spatial` — map graph, within-map pathfinding, and cross-map entrance
//! routing.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                 |
//! |--------------|-----------------------------------------------------------|
//! | [`map`]      | `Map`, `Node`, `Obstacle`, `Facility`, `Position`, `Direction` |
//! | [`router`]   | `Router` trait, `DijkstraRouter` (within-map)             |
//! | [`entrance`] | `RouteSegment`, `plan_route` (cross-map BFS)              |
//! | [`error`]    | `SpatialError`, `SpatialResult<T>`                        |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                      |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.           |

pub mod entrance;
pub mod error;
pub mod map;
pub mod router;

#[cfg(test)]
mod tests;

pub use entrance::{plan_route, RouteSegment};
pub use error::{SpatialError, SpatialResult};
pub use map::{
    Direction, DoorOpening, Facility, Job, Map, Node, NodeKind, Obstacle, ObstacleKind, Position,
    TileBounds, WallSide, WorkHours,
};
pub use router::{DijkstraRouter, Router};
