//! `ActionDef` — an action's timing/effect shape (`ts_core::ActionConfig`)
//! plus the admission requirements spec.md §4.4 checks against, which the
//! core config deliberately leaves out (it's shared with `ts-time`'s decay
//! pipeline, which has no use for facility/employment/proximity gating).

use ts_core::ActionConfig;

/// Sentinel action id that never auto-completes in [`crate::executor::ActionExecutor::tick`]
/// and carries no emoji-driven world effects — a pure scheduling placeholder
/// for an in-flight behavior decision.
pub const THINKING: &str = "thinking";

/// Sentinel action id that never auto-completes — conversation turns close
/// it explicitly via `force_complete`.
pub const TALK: &str = "talk";

/// One entry in the world's action table.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionDef {
    pub config: ActionConfig,
    /// A facility on the character's map must carry at least one of these
    /// tags (and be accessible) for admission to succeed. Empty means no
    /// facility is required.
    #[cfg_attr(feature = "serde", serde(default))]
    pub required_facility_tags: Vec<String>,
    /// Requires the character's facility to expose a `job` matching their
    /// `employment`, within `workHours`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub requires_employment: bool,
    /// Requires an NPC at a cardinal neighbor of the character's node.
    #[cfg_attr(feature = "serde", serde(default))]
    pub requires_near_npc: bool,
    /// Emoji shown over the character's head while this action runs.
    #[cfg_attr(feature = "serde", serde(default))]
    pub emoji: Option<String>,
}

impl ActionDef {
    pub fn is_thinking(id: &str) -> bool {
        id == THINKING
    }

    pub fn is_talk(id: &str) -> bool {
        id == TALK
    }

    /// `thinking` and `talk` never auto-complete on a tick deadline — they
    /// are closed explicitly by the behavior/conversation layers (spec.md
    /// §4.4).
    pub fn never_auto_completes(id: &str) -> bool {
        Self::is_thinking(id) || Self::is_talk(id)
    }
}
