//! `ObservableSnapshot` — the external broadcast view (spec.md §6
//! "Observable world snapshot"), distinct from [`ts_world::WorldSnapshot`]
//! (the internal, full-fidelity deep copy `serializedState()` returns).
//!
//! This is the narrower shape spec.md §6 actually lists for a client
//! broadcast: per-character position/stats/display state and per-NPC
//! placement, without the runtime bookkeeping (navigation path, cross-map
//! route, pending-decision epoch) a client never needs.

use std::collections::HashMap;

use ts_core::{ActionId, CharacterId, MapId, NodeId, NpcId, Stats, WorldTime};
use ts_spatial::{Direction, Position};
use ts_world::{ConversationRef, WorldState};

/// A character's map-transition progress. Broadcast per-character rather
/// than as a single world-wide field — spec.md §3 stores `transition` on
/// the per-character runtime state, so a world with more than one
/// character needs one of these per character in transit, not a single
/// global field (see DESIGN.md's Open Question resolutions).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransitionView {
    pub from_map_id: MapId,
    pub to_map_id: MapId,
    pub progress: f32,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObservableCharacter {
    pub position: Position,
    pub direction: Direction,
    pub current_map_id: MapId,
    pub current_node_id: NodeId,
    pub stats: Stats,
    pub display_emoji: Option<String>,
    pub conversation: Option<ConversationRef>,
    pub current_action_id: Option<ActionId>,
    pub transition: Option<TransitionView>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObservableNpc {
    pub map_id: MapId,
    pub position: Position,
    pub direction: Direction,
    pub is_in_conversation: bool,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObservableSnapshot {
    pub characters: HashMap<CharacterId, ObservableCharacter>,
    pub npcs: HashMap<NpcId, ObservableNpc>,
    pub current_map_id: Option<MapId>,
    pub time: WorldTime,
    pub is_paused: bool,
    pub tick: u64,
}

impl ObservableSnapshot {
    pub fn capture(world: &WorldState) -> Self {
        let characters = world
            .characters()
            .map(|c| {
                let transition = c.transition.as_ref().map(|t| TransitionView {
                    from_map_id: t.from_map_id.clone(),
                    to_map_id: t.to_map_id.clone(),
                    progress: t.progress,
                });
                (
                    c.id.clone(),
                    ObservableCharacter {
                        position: c.position,
                        direction: c.direction,
                        current_map_id: c.current_map_id.clone(),
                        current_node_id: c.current_node_id.clone(),
                        stats: c.stats,
                        display_emoji: c.display_emoji.clone(),
                        conversation: c.conversation.clone(),
                        current_action_id: c.current_action.as_ref().map(|a| a.action_id.clone()),
                        transition,
                    },
                )
            })
            .collect();

        let npcs = world
            .npcs()
            .map(|n| {
                (
                    n.id.clone(),
                    ObservableNpc {
                        map_id: n.map_id.clone(),
                        position: n.position,
                        direction: n.direction,
                        is_in_conversation: n.is_in_conversation,
                    },
                )
            })
            .collect();

        Self {
            characters,
            npcs,
            current_map_id: world.current_map_id().cloned(),
            time: world.time(),
            is_paused: world.is_paused(),
            tick: world.tick(),
        }
    }
}
