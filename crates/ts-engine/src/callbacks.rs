//! `EngineObserver` — the external callback surface for the tick loop.
//!
//! Grounded on `dt-sim::observer::SimObserver`: one default-no-op method per
//! notification the tick loop can raise, rather than a `Vec<EngineEvent>`
//! returned from `tick`. The lower crates (`ts-mobility`, `ts-actions`)
//! follow spec.md §9's "callbacks → message passing" note and return event
//! vectors for *this* crate to drain; once drained, the engine re-exposes
//! them to its own caller the way the teacher's simulation loop does —
//! through an observer trait object threaded into `tick`/`run`.

use ts_conversation::{ConversationSession, Message};
use ts_core::{ActionId, CharacterId, NpcId, StatusType};
use ts_schedule::ActionHistoryEntry;

/// Notifications raised over the course of one engine tick. Every method
/// defaults to doing nothing, so a caller only overrides what it cares
/// about (spec.md §6's callback list, minus the ones with no external
/// audience — `onRecordHistory` is folded into this trait rather than
/// kept as a silent internal step, since a UI or logger plausibly wants
/// it too).
pub trait EngineObserver {
    fn on_tick_start(&mut self, _tick: u64) {}
    fn on_tick_end(&mut self, _tick: u64) {}

    fn on_navigation_complete(&mut self, _character_id: &CharacterId) {}

    fn on_action_start(&mut self, _character_id: &CharacterId, _action_id: &ActionId) {}
    fn on_action_complete(&mut self, _character_id: &CharacterId, _action_id: &ActionId) {}
    fn on_record_history(&mut self, _character_id: &CharacterId, _entry: &ActionHistoryEntry) {}

    fn on_status_interrupt(&mut self, _character_id: &CharacterId, _stat: StatusType) {}

    fn on_conversation_start(&mut self, _session: &ConversationSession) {}
    fn on_message_emit(&mut self, _character_id: &CharacterId, _npc_id: &NpcId, _message: &Message) {}
    fn on_conversation_end(&mut self, _session: &ConversationSession) {}
    /// Fires after [`Self::on_conversation_end`], once the post-processing
    /// extraction (if any) has already been applied to the world.
    fn on_conversation_complete(&mut self, _character_id: &CharacterId, _goal_achieved: bool) {}
}

/// An `EngineObserver` that does nothing — the default for headless runs
/// that only care about the resulting `WorldState`, not its transitions.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}
