//! Map, node, obstacle, and facility types.

use std::collections::{HashMap, HashSet};

use ts_core::{FacilityId, GridDefaults, JobId, MapId, NodeId};

/// One of four cardinal directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Floating-point map-pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A navigation-graph node.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    pub kind: NodeKind,
    pub connected_to: HashSet<NodeId>,
    /// Present only on `NodeKind::Entrance` nodes. Symmetric by construction:
    /// see [`Map::validate_leads_to_symmetry`].
    pub leads_to: Option<(MapId, NodeId)>,
    pub label: Option<String>,
}

impl Node {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    Waypoint,
    Spawn,
    Entrance,
}

/// A rectangular tile-bounded region blocking or zoning part of the map.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Obstacle {
    pub kind: ObstacleKind,
    pub bounds: TileBounds,
    pub wall_sides: Option<Vec<WallSide>>,
    pub door: Option<DoorOpening>,
    pub facility: Option<Facility>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObstacleKind {
    /// Subtracts nodes and blocks pathing entirely.
    Building,
    /// Wraps a sub-region; may have walled sides with a single door opening.
    Zone,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileBounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl TileBounds {
    pub fn contains_tile(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WallSide {
    North,
    South,
    East,
    West,
}

/// A single door opening on one wall side, given as a tile offset along that
/// side. A zone obstacle may declare at most one per wall side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DoorOpening {
    pub side: WallSide,
    pub offset: i32,
}

/// A tagged region characters can be looked up against by node membership.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Facility {
    pub id: FacilityId,
    pub tags: HashSet<String>,
    pub owner: Option<ts_core::CharacterId>,
    pub cost: Option<i64>,
    pub job: Option<Job>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Job {
    pub job_id: JobId,
    pub title: String,
    pub hourly_wage: f32,
    pub work_hours: WorkHours,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkHours {
    pub start: u8,
    pub end: u8,
}

/// One grid-of-rooms level: loaded once at boot and immutable thereafter.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Map {
    pub id: MapId,
    pub width: i32,
    pub height: i32,
    pub background_color: String,
    pub spawn_node_id: NodeId,
    pub nodes: HashMap<NodeId, Node>,
    pub obstacles: Vec<Obstacle>,
}

impl Map {
    /// Entrance nodes, in deterministic (sorted by id) order.
    pub fn entrance_nodes(&self) -> Vec<&Node> {
        let mut v: Vec<&Node> = self
            .nodes
            .values()
            .filter(|n| n.kind == NodeKind::Entrance)
            .collect();
        v.sort_by(|a, b| a.id.cmp(&b.id));
        v
    }

    /// All facilities declared by this map's zone/building obstacles.
    pub fn facilities(&self) -> impl Iterator<Item = &Facility> {
        self.obstacles.iter().filter_map(|o| o.facility.as_ref())
    }

    /// Precompute a `node_id → facility ids` membership index: which
    /// facility-carrying obstacles a given node's tile falls inside. Callers
    /// (`ts-actions`) build this once at boot per map rather than scanning
    /// every obstacle on every admission check.
    pub fn facility_membership_index(&self, grid: &GridDefaults) -> HashMap<NodeId, Vec<FacilityId>> {
        let mut index: HashMap<NodeId, Vec<FacilityId>> = HashMap::new();
        for node in self.nodes.values() {
            let tile_x = (node.x / grid.cell_width).floor() as i32;
            let tile_y = (node.y / grid.cell_height).floor() as i32;
            for obstacle in &self.obstacles {
                let Some(facility) = &obstacle.facility else { continue };
                if obstacle.bounds.contains_tile(tile_x, tile_y) {
                    index.entry(node.id.clone()).or_default().push(facility.id.clone());
                }
            }
        }
        index
    }

    /// Check the `leadsTo` symmetry invariant: every entrance's target, if it
    /// targets back into this same map, must point to an entrance whose own
    /// `leadsTo` points back here.
    pub fn validate_leads_to_symmetry(&self, self_id: &MapId) -> bool {
        for node in self.nodes.values() {
            if let Some((target_map, target_node)) = &node.leads_to {
                if target_map == self_id {
                    match self.nodes.get(target_node) {
                        Some(back) => match &back.leads_to {
                            Some((back_map, back_node)) => {
                                if back_map != self_id || back_node != &node.id {
                                    return false;
                                }
                            }
                            None => return false,
                        },
                        None => return false,
                    }
                }
            }
        }
        true
    }
}
