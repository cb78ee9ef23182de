//! `CharacterRecord` — the persisted slice of [`ts_world::Character`]
//! (spec.md §9 "runtime-only vs persisted state"; spec.md §4.9 "save/load
//! ... persisted scalar/position fields only — runtime state
//! re-initialized on load").

use ts_core::{CharacterId, JobId, MapId, NodeId, Stats};
use ts_spatial::{Direction, Position};
use ts_world::{Character, CrossMapNav, Employment, LlmProfile, NavigationState};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacterRecord {
    pub id: CharacterId,
    pub name: String,
    pub sprite: serde_json::Value,
    pub money: i64,
    pub stats: Stats,
    pub current_map_id: MapId,
    pub current_node_id: NodeId,
    pub position: Position,
    pub direction: Direction,
    pub job_id: Option<JobId>,
    pub profile: Option<LlmProfile>,
}

impl CharacterRecord {
    /// Extract the persisted slice from a live `Character`, rounding stats
    /// to two decimals (spec.md §4.9).
    pub fn from_character(character: &Character) -> Self {
        let mut stats = character.stats;
        stats.round_for_persistence();
        Self {
            id: character.id.clone(),
            name: character.name.clone(),
            sprite: character.sprite.clone(),
            money: character.money,
            stats,
            current_map_id: character.current_map_id.clone(),
            current_node_id: character.current_node_id.clone(),
            position: character.position,
            direction: character.direction,
            job_id: character.employment.as_ref().map(|e| e.job_id.clone()),
            profile: character.profile.clone(),
        }
    }

    /// Rehydrate a full `Character`, re-initializing every runtime-only
    /// field to its idle default (spec.md §9). The caller supplements
    /// `profile` from the static character bundle when this record's is
    /// `None` (spec.md §4.10 restore step) — this method only reproduces
    /// what the store itself persisted.
    pub fn into_character(self) -> Character {
        Character {
            id: self.id,
            name: self.name,
            sprite: self.sprite,
            money: self.money,
            stats: self.stats,
            current_map_id: self.current_map_id,
            current_node_id: self.current_node_id,
            position: self.position,
            direction: self.direction,
            employment: self.job_id.map(|job_id| Employment { job_id }),
            profile: self.profile,
            navigation: NavigationState::idle(),
            cross_map_navigation: CrossMapNav::idle(),
            transition: None,
            conversation: None,
            current_action: None,
            pending_action: None,
            action_counter: 0,
            display_emoji: None,
        }
    }
}
