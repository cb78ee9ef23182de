//! `DecisionContext` — the read-only snapshot `BehaviorDecider::decide`
//! receives, assembled by the engine each time a character becomes eligible
//! for a new decision (spec.md §4.7 "Inputs assembled by the engine").
//!
//! Grounded on `dt-behavior::context::SimContext`'s shape: a borrowed,
//! read-only bundle built once per call rather than a set of live store
//! handles, so `BehaviorDecider` never needs write access.

use ts_core::{MapId, NpcId, WorldTime};
use ts_schedule::{ActionHistoryEntry, ScheduleEntry};
use ts_world::Character;

/// An NPC present on the character's current map, with just enough detail
/// for the LLM prompt / rules fallback to reason about it.
#[derive(Clone, Debug, PartialEq)]
pub struct NearbyNpc {
    pub npc_id: NpcId,
    pub name: String,
    pub affinity: i32,
}

/// A map reachable from the character's current map, with its entrance-graph
/// hop distance (spec.md §4.2's cross-map BFS).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReachableMap {
    pub map_id: MapId,
    pub distance: u32,
}

impl ReachableMap {
    pub fn new(map_id: MapId, distance: u32) -> Self {
        Self { map_id, distance }
    }
}

/// A lightweight view of an active mid-term memory. Deliberately local
/// rather than `ts_conversation`'s owned type — `ts-behavior` only needs the
/// text, not the full expiry/provenance bookkeeping `ts-conversation` tracks
/// (same decoupling as `ts-actions::events::ActionEvent::RecordHistory`).
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryRef {
    pub text: String,
}

/// A recent conversation's post-processed summary.
#[derive(Clone, Debug, PartialEq)]
pub struct ConversationSummaryRef {
    pub npc_id: NpcId,
    pub summary: String,
}

/// Everything `BehaviorDecider::decide` is allowed to read.
pub struct DecisionContext<'a> {
    pub character: &'a Character,
    pub schedule_today: &'a [ScheduleEntry],
    pub recent_history: &'a [ActionHistoryEntry],
    pub nearby_npcs: &'a [NearbyNpc],
    pub reachable_maps: &'a [ReachableMap],
    pub active_memories: &'a [MemoryRef],
    pub recent_summaries: &'a [ConversationSummaryRef],
    pub current_time: WorldTime,
}
