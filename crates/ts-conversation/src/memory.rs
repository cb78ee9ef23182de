//! `MidTermMemory` and its importance-based expiry (spec.md §3).

use ts_core::{CharacterId, MemoryId, NpcId};

// Always (de)serializable: extraction responses from the LLM carry this
// regardless of whether the `serde` cargo feature (which gates this
// crate's own session/memory types) is enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    Medium,
    High,
}

impl Importance {
    /// Expiry offset in days past `createdDay` — `low=0, medium=1, high=2`
    /// (spec.md §3).
    pub fn expiry_offset_days(self) -> u64 {
        match self {
            Importance::Low => 0,
            Importance::Medium => 1,
            Importance::High => 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MidTermMemory {
    pub id: MemoryId,
    pub character_id: CharacterId,
    pub content: String,
    pub importance: Importance,
    pub created_day: u64,
    pub expires_day: u64,
    pub source_npc_id: Option<NpcId>,
}

impl MidTermMemory {
    pub fn is_active(&self, current_day: u64) -> bool {
        self.expires_day >= current_day
    }
}
