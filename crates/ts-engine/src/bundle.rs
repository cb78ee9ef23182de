//! Boot-time bundle types — the static data a deployment feeds into
//! [`crate::bootstrap`] to populate a fresh or restored [`crate::engine::Engine`].
//!
//! These mirror the teacher's own world-seed JSON shape (character/NPC/map
//! fixtures loaded once at startup) but are generalized to this spec's
//! domain objects. `WorldConfig.actions` (ts-core) only ever carries timing
//! and stat effects — it has no notion of facility or employment gating —
//! so admission requirements live in a separate bundle here and get merged
//! per action id at boot.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_actions::{ActionDef, TALK, THINKING};
use ts_core::{ActionConfig, ActionId, CharacterId, JobId, MapId, NodeId};
use ts_schedule::ScheduleEntry;
use ts_spatial::{Direction, Position};
use ts_world::LlmProfile;

fn default_direction() -> Direction {
    Direction::Down
}

/// One character's boot-time seed: identity, starting placement, and the
/// default schedule `ScheduleManager` falls back on when no store override
/// exists for a given day.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CharacterBundleEntry {
    pub id: CharacterId,
    pub name: String,
    #[serde(default)]
    pub sprite: serde_json::Value,
    #[serde(default)]
    pub money: i64,
    pub current_map_id: MapId,
    pub current_node_id: NodeId,
    pub position: Position,
    #[serde(default = "default_direction")]
    pub direction: Direction,
    #[serde(default)]
    pub job_id: Option<JobId>,
    #[serde(default)]
    pub profile: Option<LlmProfile>,
    #[serde(default)]
    pub default_schedule: Vec<ScheduleEntry>,
}

/// One NPC's boot-time seed: identity, placement, and any facts known about
/// it before a single conversation has ever taken place.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NpcBundleEntry {
    pub id: ts_core::NpcId,
    pub name: String,
    pub map_id: MapId,
    pub node_id: NodeId,
    pub position: Position,
    #[serde(default)]
    pub facts: Vec<String>,
}

/// The admission requirements half of an action definition — the half
/// `WorldConfig.actions` doesn't carry. Keyed by the same `ActionId` as
/// `WorldConfig.actions` and merged with it in [`build_action_table`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActionAdmissionEntry {
    #[serde(default)]
    pub required_facility_tags: Vec<String>,
    #[serde(default)]
    pub requires_employment: bool,
    #[serde(default)]
    pub requires_near_npc: bool,
    #[serde(default)]
    pub emoji: Option<String>,
}

/// Merges `WorldConfig.actions` (timing/effects) with the admission bundle
/// (facility/employment/proximity gating) into the `ActionDef` table
/// `ActionExecutor::new` expects, then injects the two engine-owned
/// sentinel actions — `thinking` and `talk` — which never appear in either
/// source: they exist purely to occupy `Character::current_action` while a
/// behavior decision or conversation is in flight, never auto-complete, and
/// never fire `ActionEvent::Completed`/`RecordHistory` callbacks.
pub fn build_action_table(
    configs: &HashMap<ActionId, ActionConfig>,
    admission: &HashMap<ActionId, ActionAdmissionEntry>,
) -> HashMap<ActionId, ActionDef> {
    let mut table = HashMap::with_capacity(configs.len() + 2);
    for (id, config) in configs {
        let entry = admission.get(id).cloned().unwrap_or_default();
        table.insert(
            id.clone(),
            ActionDef {
                config: config.clone(),
                required_facility_tags: entry.required_facility_tags,
                requires_employment: entry.requires_employment,
                requires_near_npc: entry.requires_near_npc,
                emoji: entry.emoji,
            },
        );
    }

    let sentinel_config = || ActionConfig::Fixed { duration_minutes: 0, effects: HashMap::new() };
    table.entry(ActionId::new(THINKING)).or_insert_with(|| ActionDef {
        config: sentinel_config(),
        required_facility_tags: Vec::new(),
        requires_employment: false,
        requires_near_npc: false,
        emoji: None,
    });
    table.entry(ActionId::new(TALK)).or_insert_with(|| ActionDef {
        config: sentinel_config(),
        required_facility_tags: Vec::new(),
        requires_employment: false,
        requires_near_npc: false,
        emoji: None,
    });

    table
}
