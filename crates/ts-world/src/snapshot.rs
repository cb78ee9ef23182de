//! `WorldSnapshot` — the broadcast-safe, deep-copied view of a
//! [`WorldState`] (spec.md §6, the `serializedState()` external interface).
//!
//! A snapshot is read-only and owns all its data, so taking one never holds
//! a borrow against the live `WorldState` — callers can serialize it to JSON
//! for a client or a log line after the engine has already moved on to the
//! next tick.

use std::collections::HashMap;

use ts_core::{CharacterId, NpcId, WorldTime};

use crate::character::Character;
use crate::npc::Npc;
use crate::world::WorldState;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldSnapshot {
    pub time: WorldTime,
    pub tick: u64,
    pub paused: bool,
    pub characters: HashMap<CharacterId, Character>,
    pub npcs: HashMap<NpcId, Npc>,
}

impl WorldSnapshot {
    pub fn capture(world: &WorldState) -> Self {
        Self {
            time: world.time(),
            tick: world.tick(),
            paused: world.is_paused(),
            characters: world.characters().map(|c| (c.id.clone(), c.clone())).collect(),
            npcs: world.npcs().map(|n| (n.id.clone(), n.clone())).collect(),
        }
    }
}
