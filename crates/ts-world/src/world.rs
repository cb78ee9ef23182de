//! `WorldState` — the single authoritative in-memory store (spec.md §4.1,
//! component C1).
//!
//! Every mutation to a character or NPC record goes through a method here so
//! the cross-field invariants in spec.md §8 (at most one `currentAction`,
//! `isMoving ⇒ path.length ≥ 2`, ...) are enforced atomically at one choke
//! point. `ts-mobility`, `ts-actions`, `ts-behavior`, and `ts-conversation`
//! all hold a `&mut WorldState` (or, for conversation background tasks, post
//! results back to the engine which applies them through one) rather than
//! mutating `Character`/`Npc` fields directly.

use std::collections::HashMap;

use ts_core::{CharacterId, MapId, NodeId, NpcId, WorldTime};
use ts_spatial::{Direction, Position};

use crate::character::{
    ActionState, Character, ConversationRef, CrossMapNav, NavigationState, PendingDecision,
    TransitionPhase, TransitionState,
};
use crate::error::{WorldError, WorldResult};
use crate::npc::Npc;
use crate::snapshot::WorldSnapshot;

pub struct WorldState {
    characters: HashMap<CharacterId, Character>,
    npcs: HashMap<NpcId, Npc>,
    time: WorldTime,
    current_map_id: Option<MapId>,
    tick: u64,
    paused: bool,
}

impl WorldState {
    pub fn new() -> Self {
        Self {
            characters: HashMap::new(),
            npcs: HashMap::new(),
            time: WorldTime::ZERO,
            current_map_id: None,
            tick: 0,
            paused: false,
        }
    }

    // ── Character CRUD ──────────────────────────────────────────────────

    pub fn add_character(&mut self, character: Character) -> WorldResult<()> {
        if self.characters.contains_key(&character.id) {
            return Err(WorldError::CharacterAlreadyExists(character.id.clone()));
        }
        self.characters.insert(character.id.clone(), character);
        Ok(())
    }

    pub fn get_character(&self, id: &CharacterId) -> WorldResult<&Character> {
        self.characters.get(id).ok_or_else(|| WorldError::CharacterNotFound(id.clone()))
    }

    pub fn get_character_mut(&mut self, id: &CharacterId) -> WorldResult<&mut Character> {
        self.characters.get_mut(id).ok_or_else(|| WorldError::CharacterNotFound(id.clone()))
    }

    pub fn remove_character(&mut self, id: &CharacterId) -> WorldResult<Character> {
        self.characters.remove(id).ok_or_else(|| WorldError::CharacterNotFound(id.clone()))
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    pub fn character_ids(&self) -> impl Iterator<Item = &CharacterId> {
        self.characters.keys()
    }

    // ── Position / direction / map ─────────────────────────────────────

    pub fn set_position(&mut self, id: &CharacterId, position: Position) -> WorldResult<()> {
        self.get_character_mut(id)?.position = position;
        Ok(())
    }

    pub fn set_direction(&mut self, id: &CharacterId, direction: Direction) -> WorldResult<()> {
        self.get_character_mut(id)?.direction = direction;
        Ok(())
    }

    /// Move a character onto `node_id` without changing its map — a segment
    /// boundary crossed mid-route, as opposed to [`Self::set_character_map`]
    /// which also changes `current_map_id`.
    pub fn set_current_node(&mut self, id: &CharacterId, node_id: NodeId) -> WorldResult<()> {
        self.get_character_mut(id)?.current_node_id = node_id;
        Ok(())
    }

    /// Atomically move a character onto `(map_id, node_id)` at `position` —
    /// the teleport step of the map-transition FSM (spec.md §4.3).
    pub fn set_character_map(
        &mut self,
        id: &CharacterId,
        map_id: MapId,
        node_id: NodeId,
        position: Position,
    ) -> WorldResult<()> {
        let character = self.get_character_mut(id)?;
        character.current_map_id = map_id;
        character.current_node_id = node_id;
        character.position = position;
        Ok(())
    }

    // ── Navigation ───────────────────────────────────────────────────────

    pub fn start_navigation(&mut self, id: &CharacterId, nav: NavigationState) -> WorldResult<()> {
        if !nav.is_valid() {
            tracing::warn!(character = %id, "start_navigation called with invalid NavigationState");
        }
        self.get_character_mut(id)?.navigation = nav;
        Ok(())
    }

    /// Overwrite the in-flight navigation state with a newly-interpolated
    /// one (called every tick by `ts-mobility` while `is_moving`).
    pub fn advance_navigation(&mut self, id: &CharacterId, nav: NavigationState) -> WorldResult<()> {
        let character = self.get_character_mut(id)?;
        if !character.navigation.is_moving {
            return Err(WorldError::NoActiveNavigation(id.clone()));
        }
        character.navigation = nav;
        Ok(())
    }

    pub fn complete_navigation(&mut self, id: &CharacterId) -> WorldResult<()> {
        self.get_character_mut(id)?.navigation = NavigationState::idle();
        Ok(())
    }

    // ── Map transition FSM ────────────────────────────────────────────────

    pub fn start_transition(&mut self, id: &CharacterId, transition: TransitionState) -> WorldResult<()> {
        self.get_character_mut(id)?.transition = Some(transition);
        Ok(())
    }

    pub fn update_transition(
        &mut self,
        id: &CharacterId,
        phase: TransitionPhase,
        progress: f32,
    ) -> WorldResult<()> {
        let character = self.get_character_mut(id)?;
        let t = character.transition.as_mut().ok_or_else(|| WorldError::NoActiveTransition(id.clone()))?;
        t.phase = phase;
        t.progress = progress.clamp(0.0, 1.0);
        Ok(())
    }

    pub fn end_transition(&mut self, id: &CharacterId) -> WorldResult<()> {
        self.get_character_mut(id)?.transition = None;
        Ok(())
    }

    // ── Cross-map navigation ─────────────────────────────────────────────

    pub fn start_cross_map_nav(&mut self, id: &CharacterId, nav: CrossMapNav) -> WorldResult<()> {
        self.get_character_mut(id)?.cross_map_navigation = nav;
        Ok(())
    }

    pub fn advance_cross_map_nav(&mut self, id: &CharacterId) -> WorldResult<()> {
        let character = self.get_character_mut(id)?;
        if !character.cross_map_navigation.is_active {
            return Err(WorldError::NoActiveCrossMapNav(id.clone()));
        }
        character.cross_map_navigation.current_segment_index += 1;
        Ok(())
    }

    pub fn complete_cross_map_nav(&mut self, id: &CharacterId) -> WorldResult<()> {
        self.get_character_mut(id)?.cross_map_navigation = CrossMapNav::idle();
        Ok(())
    }

    // ── Actions ──────────────────────────────────────────────────────────

    pub fn set_current_action(&mut self, id: &CharacterId, action: Option<ActionState>) -> WorldResult<()> {
        self.get_character_mut(id)?.current_action = action;
        Ok(())
    }

    pub fn set_pending_action(&mut self, id: &CharacterId, pending: Option<PendingDecision>) -> WorldResult<()> {
        self.get_character_mut(id)?.pending_action = pending;
        Ok(())
    }

    pub fn set_display_emoji(&mut self, id: &CharacterId, emoji: Option<String>) -> WorldResult<()> {
        self.get_character_mut(id)?.display_emoji = emoji;
        Ok(())
    }

    /// Bump and return the character's `actionCounter` — the epoch stamped
    /// onto a dispatched behavior decision so stale results can be dropped
    /// (spec.md §5).
    pub fn next_action_epoch(&mut self, id: &CharacterId) -> WorldResult<u64> {
        let character = self.get_character_mut(id)?;
        character.action_counter = character.action_counter.wrapping_add(1);
        Ok(character.action_counter)
    }

    // ── Conversation flags ───────────────────────────────────────────────

    pub fn set_character_conversation(
        &mut self,
        id: &CharacterId,
        conversation: Option<ConversationRef>,
    ) -> WorldResult<()> {
        self.get_character_mut(id)?.conversation = conversation;
        Ok(())
    }

    pub fn set_npc_conversation_flag(&mut self, id: &NpcId, active: bool) -> WorldResult<()> {
        self.get_npc_mut(id)?.is_in_conversation = active;
        Ok(())
    }

    pub fn get_npc_conversation_flag(&self, id: &NpcId) -> WorldResult<bool> {
        Ok(self.get_npc(id)?.is_in_conversation)
    }

    // ── NPC CRUD ─────────────────────────────────────────────────────────

    pub fn add_npc(&mut self, npc: Npc) {
        self.npcs.insert(npc.id.clone(), npc);
    }

    pub fn get_npc(&self, id: &NpcId) -> WorldResult<&Npc> {
        self.npcs.get(id).ok_or_else(|| WorldError::NpcNotFound(id.clone()))
    }

    pub fn get_npc_mut(&mut self, id: &NpcId) -> WorldResult<&mut Npc> {
        self.npcs.get_mut(id).ok_or_else(|| WorldError::NpcNotFound(id.clone()))
    }

    pub fn npcs(&self) -> impl Iterator<Item = &Npc> {
        self.npcs.values()
    }

    /// NPCs sharing `map_id`, for `nearNpc` admission checks and
    /// `BehaviorDecider`'s "nearby NPCs" input.
    pub fn npcs_on_map<'a>(&'a self, map_id: &'a MapId) -> impl Iterator<Item = &'a Npc> + 'a {
        self.npcs.values().filter(move |n| &n.map_id == map_id)
    }

    // ── Time / tick / pause ──────────────────────────────────────────────

    pub fn time(&self) -> WorldTime {
        self.time
    }

    pub fn set_time(&mut self, time: WorldTime) {
        self.time = time;
    }

    pub fn current_map_id(&self) -> Option<&MapId> {
        self.current_map_id.as_ref()
    }

    pub fn set_current_map_id(&mut self, map_id: Option<MapId>) {
        self.current_map_id = map_id;
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn increment_tick(&mut self) -> u64 {
        self.tick = self.tick.wrapping_add(1);
        self.tick
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    // ── Snapshot ─────────────────────────────────────────────────────────

    /// A deep-copied, broadcast-safe snapshot (spec.md §4.1, §6).
    pub fn serialized_state(&self) -> WorldSnapshot {
        WorldSnapshot::capture(self)
    }
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new()
    }
}
