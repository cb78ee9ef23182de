//! `Character` and its runtime-only sub-states (spec.md §3, §9
//! "runtime-only vs persisted state").

use chrono::{DateTime, Utc};
use ts_core::{ActionId, CharacterId, FacilityId, JobId, MapId, NodeId, NpcId, SessionId, Stats};
use ts_spatial::{Direction, Position, RouteSegment};

/// A character's job assignment. `Facility::job` carries the wage/hours;
/// this just names which job the character holds.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Employment {
    pub job_id: JobId,
}

/// Optional LLM-facing characterization. Never consumed by this crate —
/// `ts-behavior`/`ts-conversation` read it when assembling prompts.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LlmProfile {
    pub personality: Option<String>,
    pub tendencies: Vec<String>,
    pub custom_prompt: Option<String>,
}

/// Single-path movement state (spec.md §3: `isMoving ⇒ path.length ≥ 2`).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavigationState {
    pub is_moving: bool,
    pub path: Vec<NodeId>,
    pub current_path_index: usize,
    /// `0.0..=1.0` progress along the current path segment.
    pub progress: f32,
    pub start_position: Position,
    pub target_position: Position,
}

impl NavigationState {
    pub fn idle() -> Self {
        Self::default()
    }

    /// Invariant check used by `ts-mobility` and tests: spec.md §8 property 1.
    pub fn is_valid(&self) -> bool {
        if self.is_moving && self.path.len() < 2 {
            return false;
        }
        (0.0..=1.0).contains(&self.progress)
    }
}

/// Cross-map routing state (spec.md §3).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CrossMapNav {
    pub is_active: bool,
    pub target_map_id: Option<MapId>,
    pub target_node_id: Option<NodeId>,
    pub route: Vec<RouteSegment>,
    pub current_segment_index: usize,
}

impl CrossMapNav {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn current_segment(&self) -> Option<&RouteSegment> {
        self.route.get(self.current_segment_index)
    }

    pub fn has_more_segments(&self) -> bool {
        self.current_segment_index + 1 < self.route.len()
    }
}

/// One phase of the map-transition FSM (spec.md §4.3:
/// `fadeOut → teleport → fadeIn → idle`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransitionPhase {
    FadeOut,
    Teleport,
    FadeIn,
}

/// A character mid-transit between maps through an entrance.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransitionState {
    pub phase: TransitionPhase,
    pub from_map_id: MapId,
    pub to_map_id: MapId,
    pub to_node_id: NodeId,
    pub to_position: Position,
    /// Progress within the *current* phase, `0.0..=1.0`.
    pub progress: f32,
}

/// A character's in-flight action (spec.md §3). At most one per character;
/// its presence implies `navigation.is_moving == false` and
/// `conversation.status != active` (spec.md §8 property 2).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionState {
    pub action_id: ActionId,
    pub start_time: DateTime<Utc>,
    pub target_end_time: DateTime<Utc>,
    pub facility_id: Option<FacilityId>,
    pub target_npc_id: Option<NpcId>,
    pub duration_minutes: Option<u32>,
    pub reason: Option<String>,
}

/// A behavior decision in flight for this character (the `thinking`
/// placeholder's bookkeeping). `epoch` is the `actionCounter` value at
/// dispatch time so stale results can be detected and dropped (spec.md §5).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingDecision {
    pub epoch: u64,
}

/// A lightweight pointer to an active conversation session, stored on the
/// character rather than the full session object (owned by
/// `ts-conversation::ConversationManager`) to avoid a crate dependency
/// cycle — `ts-world` never needs to know a session's messages, only that
/// one is active and with whom.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConversationRef {
    pub session_id: SessionId,
    pub npc_id: NpcId,
}

/// A simulated character: the persisted fields plus the runtime-only ones
/// re-initialized on every load (spec.md §9).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Character {
    // ── Persisted ───────────────────────────────────────────────────────
    pub id: CharacterId,
    pub name: String,
    /// Opaque sprite descriptor — this spec leaves its shape to the
    /// rendering client (spec.md §9 open question (b)).
    pub sprite: serde_json::Value,
    pub money: i64,
    pub stats: Stats,
    pub current_map_id: MapId,
    pub current_node_id: NodeId,
    pub position: Position,
    pub direction: Direction,
    pub employment: Option<Employment>,
    pub profile: Option<LlmProfile>,

    // ── Runtime-only (re-initialized on load, never persisted) ─────────
    pub navigation: NavigationState,
    pub cross_map_navigation: CrossMapNav,
    pub transition: Option<TransitionState>,
    pub conversation: Option<ConversationRef>,
    pub current_action: Option<ActionState>,
    pub pending_action: Option<PendingDecision>,
    pub action_counter: u64,
    pub display_emoji: Option<String>,
}

impl Character {
    /// `true` exactly when a behavior decision may be requested: idle (no
    /// current action, no pending decision), not mid-walk, not mid-transit,
    /// not conversing, and not moving cross-map (spec.md §4.7
    /// `canStartNewAction`, spec.md §8 invariant 2 — a decision that starts
    /// while `isMoving`/`conversation` is active would stomp `currentAction`
    /// onto a character invariant 2 says can't have both at once).
    pub fn can_start_new_action(&self) -> bool {
        self.current_action.is_none()
            && self.pending_action.is_none()
            && !self.cross_map_navigation.is_active
            && !self.navigation.is_moving
            && self.conversation.is_none()
            && self.transition.is_none()
    }

    /// spec.md §8 property 2: `currentAction != null ⇒ !isMoving && conversation.status != active`.
    pub fn invariants_hold(&self) -> bool {
        if self.current_action.is_some() && (self.navigation.is_moving || self.conversation.is_some()) {
            return false;
        }
        self.navigation.is_valid()
    }
}
