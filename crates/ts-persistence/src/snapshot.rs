//! `StateSnapshot` — the payload of `saveState(full)`/`loadState()`
//! (spec.md §4.9).

use chrono::{DateTime, Utc};
use ts_core::{MapId, WorldTime};
use ts_conversation::NpcDynamicState;

use crate::record::CharacterRecord;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateSnapshot {
    pub time: WorldTime,
    pub current_map_id: Option<MapId>,
    pub server_start_time: DateTime<Utc>,
    pub characters: Vec<CharacterRecord>,
    pub npcs: Vec<NpcDynamicState>,
}
