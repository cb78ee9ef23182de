//! `Intent` — the decision `BehaviorDecider` produces (spec.md §4.7).

use serde::{Deserialize, Serialize};
use ts_core::{ActionId, FacilityId, MapId, NodeId, NpcId};

/// What a character wants to do next, as decided by an LLM call or the
/// rules fallback. Tagged so the LLM's structured JSON output
/// (`behavior-intent` schema, spec.md §6) deserializes straight into this
/// type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Intent {
    Idle { reason: String },
    MoveToNode { map_id: MapId, node_id: NodeId, reason: String },
    MoveToMap { map_id: MapId, node_id: NodeId, reason: String },
    StartAction {
        action_id: ActionId,
        #[serde(default)]
        duration_minutes: Option<u32>,
        #[serde(default)]
        facility_id: Option<FacilityId>,
        reason: String,
    },
    StartConversation { npc_id: NpcId, goal: String, reason: String },
}

impl Intent {
    pub fn reason(&self) -> &str {
        match self {
            Intent::Idle { reason }
            | Intent::MoveToNode { reason, .. }
            | Intent::MoveToMap { reason, .. }
            | Intent::StartAction { reason, .. }
            | Intent::StartConversation { reason, .. } => reason,
        }
    }
}
