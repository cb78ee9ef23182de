//! `Npc` — the dynamic conversation-partner record (spec.md §3).

use chrono::{DateTime, Utc};
use ts_core::{MapId, NodeId};
use ts_spatial::{Direction, Position};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NpcMood {
    Happy,
    Neutral,
    Sad,
    Angry,
    Excited,
}

impl Default for NpcMood {
    fn default() -> Self {
        NpcMood::Neutral
    }
}

/// An NPC: a fixed-placement conversation partner with slowly-evolving
/// dynamic state (affinity, mood, facts) updated by conversation
/// post-processing (spec.md §4.8).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Npc {
    pub id: ts_core::NpcId,
    pub name: String,
    pub map_id: MapId,
    pub node_id: NodeId,
    pub position: Position,
    pub direction: Direction,

    // ── Persisted dynamic state ─────────────────────────────────────────
    /// `-100..=100`.
    pub affinity: i32,
    pub mood: NpcMood,
    pub facts: Vec<String>,
    pub conversation_count: u32,
    pub last_conversation: Option<DateTime<Utc>>,

    // ── Runtime-only ─────────────────────────────────────────────────────
    pub is_in_conversation: bool,
}

impl Npc {
    pub fn new(id: ts_core::NpcId, name: impl Into<String>, map_id: MapId, node_id: NodeId, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            map_id,
            node_id,
            position,
            direction: Direction::Down,
            affinity: 0,
            mood: NpcMood::Neutral,
            facts: Vec::new(),
            conversation_count: 0,
            last_conversation: None,
            is_in_conversation: false,
        }
    }

    /// Clamp affinity into `[-100, 100]` (spec.md §8 property 6).
    pub fn clamp_affinity(&mut self) {
        self.affinity = self.affinity.clamp(-100, 100);
    }
}
