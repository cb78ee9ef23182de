//! `Engine` — the tick loop wiring every other `ts-*` crate together
//! (spec.md §4.10, component C10).
//!
//! Grounded on `dt-sim::Sim::process_tick`'s phased structure: arrivals,
//! wake-queue drain, intent computation, intent application, each phase
//! reading the last one's output rather than interleaving reads and writes.
//! The phases here are spec.md §4.10's own list (decay → actions → movement
//! → behavior drain → conversation drain) rather than the teacher's, but the
//! "collect this phase's events, then react to them in the next" shape is
//! the same.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use ts_actions::{ActionEvent, ActionExecutor, StartActionArgs, THINKING};
use ts_behavior::{
    BehaviorDecider, ConversationSummaryRef, DecisionContext, Intent, MemoryRef, NearbyNpc, ReachableMap,
};
use ts_conversation::{
    apply_extraction, ConversationEvent, ConversationExecutor, ConversationManager, ConversationOutcome,
    ConversationStore, Goal,
};
use ts_core::{ActionId, CharacterId, MapId, StatusType};
use ts_mobility::{CharacterSimulator, MobilityEvent};
use ts_persistence::{CharacterRecord, StateSnapshot, StateStore};
use ts_schedule::{ActionHistoryEntry, ScheduleManager, ScheduleStore};
use ts_time::{decay_stats, pick_interrupt, TimeManager};
use ts_world::{Character, WorldState};

use crate::callbacks::EngineObserver;
use crate::error::{EngineError, EngineResult};
use crate::snapshot::ObservableSnapshot;

const DECISION_CHANNEL_CAPACITY: usize = 64;
const STORE_WRITE_CHANNEL_CAPACITY: usize = 8;

/// A completed (possibly LLM-backed) behavior decision, posted back from a
/// spawned task. `epoch` must still match the character's
/// `pendingAction.epoch` when drained, or the result is stale and dropped
/// (spec.md §5).
struct BehaviorDecisionResult {
    character_id: CharacterId,
    epoch: u64,
    intent: Intent,
}

/// A background `saveState` call's outcome, drained purely for logging —
/// the running `WorldState` is the source of truth, a lagging save is not
/// fatal (spec.md §5 "durable writes funneled through a dedicated queue").
struct StoreWriteAck {
    tick: u64,
    result: Result<(), String>,
}

/// The tick loop and every piece of mutable state it owns. Generic over the
/// durable-store implementation so tests run against
/// `ts_persistence::InMemoryStore` and production wires
/// `ts_persistence::SqliteStore` (behind the `sqlite` feature) without this
/// crate naming either directly.
pub struct Engine<S: StateStore + ScheduleStore + ConversationStore + 'static> {
    config: ts_core::WorldConfig,
    world: WorldState,
    simulator: CharacterSimulator,
    action_executor: ActionExecutor,
    time_manager: TimeManager,
    schedule_manager: ScheduleManager,
    behavior_decider: Arc<BehaviorDecider>,
    conversation_manager: ConversationManager,
    conversation_executor: ConversationExecutor,
    conversation_rx: mpsc::Receiver<ConversationEvent>,
    decision_tx: mpsc::Sender<BehaviorDecisionResult>,
    decision_rx: mpsc::Receiver<BehaviorDecisionResult>,
    store: Arc<S>,
    store_write_tx: mpsc::Sender<StoreWriteAck>,
    store_write_rx: mpsc::Receiver<StoreWriteAck>,
    /// Wall-clock instant the previous tick ran, for the movement
    /// `deltaTime` handed to `CharacterSimulator::tick` — a cursor distinct
    /// from `TimeManager`'s own last-decay-pass bookkeeping (spec.md §4.5
    /// measures decay in elapsed minutes; movement measures elapsed
    /// seconds, and the two are not required to be sampled at the same
    /// cadence).
    last_tick_at: DateTime<Utc>,
}

impl<S: StateStore + ScheduleStore + ConversationStore + 'static> Engine<S> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble(
        config: ts_core::WorldConfig,
        world: WorldState,
        simulator: CharacterSimulator,
        action_executor: ActionExecutor,
        time_manager: TimeManager,
        schedule_manager: ScheduleManager,
        behavior_decider: Arc<BehaviorDecider>,
        conversation_manager: ConversationManager,
        conversation_executor: ConversationExecutor,
        conversation_rx: mpsc::Receiver<ConversationEvent>,
        store: Arc<S>,
        now: DateTime<Utc>,
    ) -> Self {
        let (decision_tx, decision_rx) = mpsc::channel(DECISION_CHANNEL_CAPACITY);
        let (store_write_tx, store_write_rx) = mpsc::channel(STORE_WRITE_CHANNEL_CAPACITY);
        Self {
            config,
            world,
            simulator,
            action_executor,
            time_manager,
            schedule_manager,
            behavior_decider,
            conversation_manager,
            conversation_executor,
            conversation_rx,
            decision_tx,
            decision_rx,
            store,
            store_write_tx,
            store_write_rx,
            last_tick_at: now,
        }
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn observable_snapshot(&self) -> ObservableSnapshot {
        ObservableSnapshot::capture(&self.world)
    }

    /// Force a synchronous save — used at shutdown, and by tests that don't
    /// want to wait on the background `spawn_blocking` ack.
    pub fn save_now(&self) -> EngineResult<()> {
        self.store.save_state(&self.build_state_snapshot())?;
        Ok(())
    }

    /// One fixed-rate step of the simulation (spec.md §4.10). Phases, in
    /// order: day-rollover check, decay + status interrupts, action
    /// lifecycle, movement, drain behavior decisions, drain conversation
    /// events, periodic background save.
    pub async fn tick<O: EngineObserver>(&mut self, observer: &mut O) -> EngineResult<()> {
        let now = Utc::now();
        let tick_number = self.world.tick();
        observer.on_tick_start(tick_number);

        let previous_time = self.world.time();
        let current_time = self.time_manager.world_time_at(now);
        if ts_core::day_rolled_over(&previous_time, &current_time) {
            debug!("day rolled over, clearing schedule/history caches");
            self.schedule_manager.clear_caches();
        }
        self.world.set_time(current_time);

        let elapsed_minutes = self.time_manager.consume_elapsed_minutes(now);
        self.apply_decay(elapsed_minutes, now, observer)?;

        let action_events = self.action_executor.tick(&mut self.world, now)?;
        self.handle_action_events(action_events, now, observer)?;

        let delta_time = (now - self.last_tick_at).num_milliseconds() as f64 / 1000.0;
        self.last_tick_at = now;
        let mobility_events = self.simulator.tick(&mut self.world, delta_time.max(0.0), now)?;
        self.handle_mobility_events(mobility_events, now, observer)?;

        self.drain_behavior_decisions(now, observer)?;
        self.drain_conversation_events(observer)?;
        self.drain_store_acks();

        let tick = self.world.increment_tick();
        observer.on_tick_end(tick);

        if self.config.timing.save_interval_ticks > 0 && tick % self.config.timing.save_interval_ticks == 0 {
            self.save_state_async(tick);
        }

        Ok(())
    }

    // ── Decay / status interrupts (spec.md §4.5) ────────────────────────

    fn apply_decay<O: EngineObserver>(
        &mut self,
        elapsed_minutes: f64,
        now: DateTime<Utc>,
        observer: &mut O,
    ) -> EngineResult<()> {
        if elapsed_minutes <= 0.0 {
            return Ok(());
        }
        let ids: Vec<CharacterId> = self.world.character_ids().cloned().collect();
        for id in &ids {
            let active = self.action_executor.get_active_per_minute_effects(&self.world, id)?;
            let crossed = {
                let character = self.world.get_character_mut(id)?;
                decay_stats(&mut character.stats, elapsed_minutes, &self.config.decay_rates, active.as_ref())
            };
            if let Some(stat) = pick_interrupt(&crossed) {
                self.handle_status_interrupt(id, stat, now, observer)?;
            }
        }
        Ok(())
    }

    /// Cancels whatever `currentAction` the character is running (unless it
    /// is already the forced action for this stat) and requests a fresh
    /// decision in interrupt mode. If the character is mid-walk,
    /// mid-transition, or mid-conversation — none of which set
    /// `currentAction` — there is nothing to force-complete here, and
    /// `dispatch_decision` itself no-ops via `can_start_new_action` (spec.md
    /// §8 invariant 2: `currentAction` must never be set while `isMoving` or
    /// `conversation` is active). The activity in flight simply finishes on
    /// its own; `BehaviorDecider::rules_fallback` re-checks every stat
    /// against the threshold on the next decision regardless of `forced`,
    /// so a still-low stat is picked up the moment the character goes idle.
    fn handle_status_interrupt<O: EngineObserver>(
        &mut self,
        id: &CharacterId,
        stat: StatusType,
        now: DateTime<Utc>,
        observer: &mut O,
    ) -> EngineResult<()> {
        observer.on_status_interrupt(id, stat);

        let forced = stat.forced_action();
        let should_cancel = {
            let character = self.world.get_character(id)?;
            match &character.current_action {
                Some(action) => forced.map_or(true, |f| action.action_id.as_str() != f),
                None => false,
            }
        };
        if should_cancel {
            self.action_executor.force_complete(&mut self.world, id)?;
        }

        self.dispatch_decision(id, now, Some(stat))?;
        Ok(())
    }

    // ── Action lifecycle (spec.md §4.4) ─────────────────────────────────

    fn handle_action_events<O: EngineObserver>(
        &mut self,
        events: Vec<ActionEvent>,
        now: DateTime<Utc>,
        observer: &mut O,
    ) -> EngineResult<()> {
        for event in events {
            match event {
                ActionEvent::Started { character_id, action_id } => {
                    observer.on_action_start(&character_id, &action_id);
                }
                ActionEvent::Completed { character_id, action_id } => {
                    observer.on_action_complete(&character_id, &action_id);
                    if self.world.get_character(&character_id)?.can_start_new_action() {
                        self.dispatch_decision(&character_id, now, None)?;
                    }
                }
                ActionEvent::RecordHistory { character_id, action_id, facility_id, target_npc_id, duration_minutes, reason } => {
                    let time = self.world.time();
                    let entry = ActionHistoryEntry {
                        time: format!("{:02}:{:02}", time.hour, time.minute),
                        action_id,
                        target: facility_id.map(|f| f.to_string()).or_else(|| target_npc_id.map(|n| n.to_string())),
                        duration_minutes,
                        reason,
                        episode: None,
                    };
                    self.schedule_manager.record_action_history(&character_id, time.day, entry.clone(), self.store.as_ref());
                    observer.on_record_history(&character_id, &entry);
                }
            }
        }
        Ok(())
    }

    // ── Movement (spec.md §4.3) ──────────────────────────────────────────

    fn handle_mobility_events<O: EngineObserver>(
        &mut self,
        events: Vec<MobilityEvent>,
        now: DateTime<Utc>,
        observer: &mut O,
    ) -> EngineResult<()> {
        for event in events {
            match event {
                MobilityEvent::NavigationComplete(character_id) => {
                    observer.on_navigation_complete(&character_id);
                    if self.world.get_character(&character_id)?.can_start_new_action() {
                        self.dispatch_decision(&character_id, now, None)?;
                    }
                }
            }
        }
        Ok(())
    }

    // ── Behavior decisions (spec.md §4.7, §5) ────────────────────────────

    /// Snapshot everything `BehaviorDecider::decide` needs into owned
    /// values and spawn the (possibly LLM-backed) decision as a background
    /// task, so the tick loop never blocks on it (spec.md §5). Occupies
    /// `currentAction` with the `thinking` sentinel for the duration.
    pub(crate) fn dispatch_decision(&mut self, character_id: &CharacterId, now: DateTime<Utc>, forced: Option<StatusType>) -> EngineResult<()> {
        let character = self.world.get_character(character_id)?;
        if !character.can_start_new_action() {
            return Ok(());
        }

        let character_snapshot = character.clone();
        let current_time = self.world.time();
        let day = current_time.day;

        let schedule_today = self
            .schedule_manager
            .schedule_for(character_id, day, self.store.as_ref())?
            .to_vec();
        let recent_history = self
            .schedule_manager
            .history_for(character_id, day, self.store.as_ref())?
            .to_vec();
        let nearby_npcs = self.nearby_npcs(&character_snapshot);
        let reachable_maps = self.reachable_maps(&character_snapshot.current_map_id);
        let active_memories: Vec<MemoryRef> = match self.store.active_memories(character_id, day) {
            Ok(memories) => memories.into_iter().map(|m| MemoryRef { text: m.content }).collect(),
            Err(e) => {
                warn!(character_id = %character_id, error = %e, "failed to load active memories");
                Vec::new()
            }
        };
        let recent_summaries = self.recent_summaries(character_id, &nearby_npcs);

        let epoch = self.world.next_action_epoch(character_id)?;
        match self.action_executor.start_action(
            &mut self.world,
            character_id,
            &ActionId::new(THINKING),
            StartActionArgs::default(),
            now,
        )? {
            Ok(_event) => {}
            Err(admission_reason) => {
                warn!(character_id = %character_id, reason = %admission_reason, "thinking placeholder rejected, skipping decision dispatch");
                return Ok(());
            }
        }
        self.world
            .set_pending_action(character_id, Some(ts_world::PendingDecision { epoch }))?;

        let decider = Arc::clone(&self.behavior_decider);
        let tx = self.decision_tx.clone();
        let id = character_id.clone();

        tokio::spawn(async move {
            let ctx = DecisionContext {
                character: &character_snapshot,
                schedule_today: &schedule_today,
                recent_history: &recent_history,
                nearby_npcs: &nearby_npcs,
                reachable_maps: &reachable_maps,
                active_memories: &active_memories,
                recent_summaries: &recent_summaries,
                current_time,
            };
            let intent = decider.decide(&ctx, forced).await;
            let _ = tx.send(BehaviorDecisionResult { character_id: id, epoch, intent }).await;
        });

        Ok(())
    }

    fn drain_behavior_decisions<O: EngineObserver>(&mut self, now: DateTime<Utc>, observer: &mut O) -> EngineResult<()> {
        while let Ok(result) = self.decision_rx.try_recv() {
            let pending_epoch = self
                .world
                .get_character(&result.character_id)
                .ok()
                .and_then(|c| c.pending_action.map(|p| p.epoch));
            if pending_epoch != Some(result.epoch) {
                debug!(character_id = %result.character_id, "dropping stale behavior decision");
                continue;
            }

            self.world.set_pending_action(&result.character_id, None)?;
            self.action_executor.force_complete(&mut self.world, &result.character_id)?;
            self.apply_intent(&result.character_id, result.intent, now, observer)?;
        }
        Ok(())
    }

    fn apply_intent<O: EngineObserver>(
        &mut self,
        character_id: &CharacterId,
        intent: Intent,
        now: DateTime<Utc>,
        observer: &mut O,
    ) -> EngineResult<()> {
        match intent {
            Intent::Idle { reason } => {
                debug!(character_id = %character_id, reason, "idle");
            }
            Intent::MoveToNode { node_id, reason, .. } => {
                debug!(character_id = %character_id, reason, "moving to node");
                if !self.simulator.navigate_to_node(&mut self.world, character_id, node_id)? {
                    self.dispatch_decision(character_id, now, None)?;
                }
            }
            Intent::MoveToMap { map_id, node_id, reason } => {
                debug!(character_id = %character_id, reason, "moving to map");
                if !self.simulator.navigate_to_map(&mut self.world, character_id, map_id, node_id)? {
                    self.dispatch_decision(character_id, now, None)?;
                }
            }
            Intent::StartAction { action_id, duration_minutes, facility_id, reason } => {
                let args = StartActionArgs {
                    facility_id,
                    target_npc_id: None,
                    duration_minutes,
                    reason: Some(reason),
                    ignore_current_action: false,
                };
                match self.action_executor.start_action(&mut self.world, character_id, &action_id, args, now)? {
                    Ok(Some(event)) => self.handle_action_events(vec![event], now, observer)?,
                    Ok(None) => {}
                    Err(admission_reason) => {
                        // spec.md §4.7's rules-fallback docs anticipate a
                        // dedicated facility-seeking retry here; this
                        // implementation instead re-dispatches a fresh
                        // decision, which on the next pass is free to
                        // choose a `MoveToNode`/`MoveToMap` toward a
                        // facility itself.
                        warn!(character_id = %character_id, reason = %admission_reason, "action admission rejected, re-deciding");
                        self.dispatch_decision(character_id, now, None)?;
                    }
                }
            }
            Intent::StartConversation { npc_id, goal, reason } => {
                let character_name = self.world.get_character(character_id)?.name.clone();
                let (npc_name, npc_facts) = {
                    let npc = self.world.get_npc(&npc_id)?;
                    (npc.name.clone(), npc.facts.clone())
                };
                // `Intent::StartConversation` only names a single `goal`
                // string (spec.md §4.7's Intent shape has no separate
                // `successCriteria` field at the decision layer); reusing
                // it as both halves of `ts_conversation::Goal` loses
                // nothing the intent actually carried — the post-processor
                // still derives `goalAchieved` from the transcript, not
                // from a from a second string.
                let session_goal = Goal { goal: goal.clone(), success_criteria: goal };

                let start_result = self
                    .conversation_manager
                    .start_conversation(&mut self.world, character_id, &npc_id, session_goal, now)
                    .map(|session| session.clone());

                match start_result {
                    Ok(session) => {
                        observer.on_conversation_start(&session);
                        self.conversation_executor.spawn(session, character_name, npc_name, npc_facts);
                    }
                    Err(e) => {
                        warn!(character_id = %character_id, error = %e, reason, "could not start conversation, re-deciding");
                        self.dispatch_decision(character_id, now, None)?;
                    }
                }
            }
        }
        Ok(())
    }

    // ── Conversations (spec.md §4.8) ─────────────────────────────────────

    fn drain_conversation_events<O: EngineObserver>(&mut self, observer: &mut O) -> EngineResult<()> {
        while let Ok(event) = self.conversation_rx.try_recv() {
            match event {
                ConversationEvent::MessageEmitted { character_id, message } => {
                    match self.conversation_manager.add_message(&character_id, message.clone()) {
                        Ok(session) => observer.on_message_emit(&character_id, &session.npc_id, &message),
                        Err(e) => warn!(character_id = %character_id, error = %e, "message for unknown conversation session"),
                    }
                }
                ConversationEvent::Completed { character_id, outcome } => {
                    self.finish_conversation(&character_id, outcome, observer)?;
                }
            }
        }
        Ok(())
    }

    fn finish_conversation<O: EngineObserver>(
        &mut self,
        character_id: &CharacterId,
        outcome: ConversationOutcome,
        observer: &mut O,
    ) -> EngineResult<()> {
        let npc_id = self
            .world
            .get_character(character_id)
            .ok()
            .and_then(|c| c.conversation.as_ref().map(|r| r.npc_id.clone()));
        let day = self.world.time().day;

        let session = self.conversation_manager.end_conversation(&mut self.world, character_id, outcome.goal_achieved)?;
        observer.on_conversation_end(&session);

        if let (Some(npc_id), Some(extraction)) = (npc_id, outcome.extraction.as_ref()) {
            if let Err(e) = apply_extraction(&mut self.world, self.store.as_ref(), character_id, &npc_id, day, Utc::now(), extraction) {
                warn!(character_id = %character_id, error = %e, "conversation extraction application failed");
            }
        }

        observer.on_conversation_complete(character_id, outcome.goal_achieved);

        if self.world.get_character(character_id)?.can_start_new_action() {
            self.dispatch_decision(character_id, Utc::now(), None)?;
        }
        Ok(())
    }

    // ── Behavior-context helpers ──────────────────────────────────────────

    fn nearby_npcs(&self, character: &Character) -> Vec<NearbyNpc> {
        self.world
            .npcs_on_map(&character.current_map_id)
            .map(|npc| NearbyNpc { npc_id: npc.id.clone(), name: npc.name.clone(), affinity: npc.affinity })
            .collect()
    }

    /// BFS over `Map::leads_to` entrance links, reusing the same shape as
    /// `ts_spatial::entrance::plan_route`'s cross-map frontier search — no
    /// ready-made "reachable maps with hop distance" helper exists in
    /// `ts-spatial` to call into directly.
    fn reachable_maps(&self, from: &MapId) -> Vec<ReachableMap> {
        let mut visited: HashSet<MapId> = HashSet::new();
        visited.insert(from.clone());
        let mut queue: VecDeque<(MapId, u32)> = VecDeque::new();
        queue.push_back((from.clone(), 0));
        let mut result = Vec::new();

        while let Some((map_id, dist)) = queue.pop_front() {
            let Some(map) = self.simulator.map(&map_id) else { continue };
            for node in map.entrance_nodes() {
                let Some((target_map, _)) = &node.leads_to else { continue };
                if visited.insert(target_map.clone()) {
                    result.push(ReachableMap::new(target_map.clone(), dist + 1));
                    queue.push_back((target_map.clone(), dist + 1));
                }
            }
        }
        result
    }

    fn recent_summaries(&self, character_id: &CharacterId, nearby: &[NearbyNpc]) -> Vec<ConversationSummaryRef> {
        let mut out = Vec::new();
        for npc in nearby {
            match self.store.recent_conversation_summaries(character_id, &npc.npc_id, 3) {
                Ok(entries) => {
                    out.extend(entries.into_iter().map(|e| ConversationSummaryRef { npc_id: e.npc_id, summary: e.summary }))
                }
                Err(e) => warn!(character_id = %character_id, npc_id = %npc.npc_id, error = %e, "failed to load conversation summaries"),
            }
        }
        out
    }

    // ── Persistence (spec.md §4.9, §5) ───────────────────────────────────

    fn build_state_snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            time: self.world.time(),
            current_map_id: self.world.current_map_id().cloned(),
            server_start_time: self.time_manager.clock().server_start,
            characters: self.world.characters().map(CharacterRecord::from_character).collect(),
            npcs: self.world.npcs().map(ts_conversation::NpcDynamicState::from_npc).collect(),
        }
    }

    /// Off-load a full save onto a blocking thread so a slow durable store
    /// (spinning disk, a busy SQLite writer) never stalls the tick loop
    /// (spec.md §5: "durable writes funneled through a dedicated queue,
    /// acknowledged asynchronously").
    fn save_state_async(&self, tick: u64) {
        let snapshot = self.build_state_snapshot();
        let store = Arc::clone(&self.store);
        let tx = self.store_write_tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = store.save_state(&snapshot).map_err(|e| e.to_string());
            let _ = tx.blocking_send(StoreWriteAck { tick, result });
        });
    }

    fn drain_store_acks(&mut self) {
        while let Ok(ack) = self.store_write_rx.try_recv() {
            if let Err(err) = ack.result {
                warn!(tick = ack.tick, error = %err, "background state save failed");
            }
        }
    }
}
