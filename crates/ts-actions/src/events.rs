//! Events `ActionExecutor` reports back to its caller.
//!
//! Same "callbacks → message passing" design as `ts-mobility::MobilityEvent`
//! (spec.md §9): `start_action`/`tick` return plain data the engine drains,
//! rather than invoking a stored callback.

use ts_core::{ActionId, CharacterId, FacilityId, NpcId};

/// Something the engine should react to after an action-lifecycle call.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionEvent {
    /// spec.md §4.4 `onActionStart` — never emitted for the `thinking`
    /// sentinel.
    Started { character_id: CharacterId, action_id: ActionId },
    /// spec.md §4.4 `onActionComplete(charId, actionId)`.
    Completed { character_id: CharacterId, action_id: ActionId },
    /// spec.md §4.4 `onRecordHistory`, kept deliberately lighter than
    /// `ts_schedule::ActionHistoryEntry` (no `time`/`episode`) so this crate
    /// doesn't need a dependency on `ts-schedule` just to name wall-clock
    /// formatting — `ts-engine` turns this into a full entry and calls
    /// `ScheduleManager::record_action_history` itself.
    RecordHistory {
        character_id: CharacterId,
        action_id: ActionId,
        facility_id: Option<FacilityId>,
        target_npc_id: Option<NpcId>,
        duration_minutes: Option<u32>,
        reason: Option<String>,
    },
}
