//! `EngineBuilder` — fresh-vs-restore boot (spec.md §4.10 "Initialization").
//!
//! Grounded on `dt-sim::SimBuilder`'s fluent construction: a builder that
//! collects the pieces a deployment provides (config, map fixtures, seed
//! bundles, store, LLM client), then does the one-time restore-or-seed
//! decision in `build`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ts_actions::ActionExecutor;
use ts_behavior::{BehaviorDecider, LLMClient};
use ts_conversation::{ConversationManager, ConversationStore, ConversationExecutor};
use ts_core::{parse_timezone, CharacterId, MapId, WorldClock, WorldConfig};
use ts_mobility::CharacterSimulator;
use ts_persistence::{CharacterRecord, StateStore};
use ts_schedule::{ScheduleManager, ScheduleStore};
use ts_spatial::{DijkstraRouter, Map, Router};
use ts_time::TimeManager;
use ts_world::{Npc, WorldState};

use crate::bundle::{build_action_table, ActionAdmissionEntry, CharacterBundleEntry, NpcBundleEntry};
use crate::engine::Engine;
use crate::error::EngineResult;

const CONVERSATION_CHANNEL_CAPACITY: usize = 256;

/// Collects everything a deployment provides once at startup, then builds
/// an [`Engine`] that's either a fresh world (no prior save) or a restored
/// one (spec.md §4.10 "On boot: attempt `loadState`; if present, restore;
/// otherwise seed from the bundle").
pub struct EngineBuilder<S> {
    config: WorldConfig,
    maps: HashMap<MapId, Map>,
    character_bundle: Vec<CharacterBundleEntry>,
    npc_bundle: Vec<NpcBundleEntry>,
    admission: HashMap<ts_core::ActionId, ActionAdmissionEntry>,
    store: Arc<S>,
    llm: Arc<dyn LLMClient>,
}

impl<S: StateStore + ScheduleStore + ConversationStore + 'static> EngineBuilder<S> {
    pub fn new(
        config: WorldConfig,
        maps: HashMap<MapId, Map>,
        character_bundle: Vec<CharacterBundleEntry>,
        npc_bundle: Vec<NpcBundleEntry>,
        store: Arc<S>,
        llm: Arc<dyn LLMClient>,
    ) -> Self {
        Self { config, maps, character_bundle, npc_bundle, admission: HashMap::new(), store, llm }
    }

    /// Facility/employment/proximity gating per action id — defaults to
    /// "no admission requirements" for any action left unspecified.
    pub fn admission(mut self, admission: HashMap<ts_core::ActionId, ActionAdmissionEntry>) -> Self {
        self.admission = admission;
        self
    }

    /// Restore from `store` if a prior save exists, otherwise seed a fresh
    /// world from the bundles, then kick an initial behavior decision for
    /// every character that starts idle. `now` is the boot instant — it
    /// anchors `TimeManager`'s first decay measurement so a long downtime
    /// between restarts doesn't replay as one giant catch-up decay pass.
    pub fn build(self, now: DateTime<Utc>) -> EngineResult<Engine<S>> {
        let existing_snapshot = self.store.load_state()?;

        let (mut world, server_start_time) = match existing_snapshot {
            Some(snapshot) => {
                let mut world = WorldState::new();
                for record in snapshot.characters {
                    let bundle_entry = self.character_bundle.iter().find(|b| b.id == record.id);
                    let mut character = record.into_character();
                    if character.profile.is_none() {
                        character.profile = bundle_entry.and_then(|b| b.profile.clone());
                    }
                    world.add_character(character)?;
                }
                let dynamic_by_npc: HashMap<_, _> =
                    snapshot.npcs.into_iter().map(|n| (n.npc_id.clone(), n)).collect();
                for entry in &self.npc_bundle {
                    let mut npc = Npc::new(entry.id.clone(), entry.name.clone(), entry.map_id.clone(), entry.node_id.clone(), entry.position);
                    npc.facts = entry.facts.clone();
                    if let Some(dynamic) = dynamic_by_npc.get(&entry.id) {
                        dynamic.apply_to(&mut npc);
                    }
                    world.add_npc(npc);
                }
                world.set_time(snapshot.time);
                world.set_current_map_id(snapshot.current_map_id);
                (world, snapshot.server_start_time)
            }
            None => {
                let mut world = WorldState::new();
                for entry in &self.character_bundle {
                    world.add_character(fresh_character(entry))?;
                }
                for entry in &self.npc_bundle {
                    let mut npc = Npc::new(entry.id.clone(), entry.name.clone(), entry.map_id.clone(), entry.node_id.clone(), entry.position);
                    npc.facts = entry.facts.clone();
                    world.add_npc(npc);
                }
                self.store.save_server_start_time(now)?;
                (world, now)
            }
        };

        // Legacy-data migration: a store written before `serverStartTime`
        // was tracked at all has no row for it yet even on a restore path.
        if self.store.load_server_start_time()?.is_none() {
            self.store.save_server_start_time(server_start_time)?;
        }

        let router: Box<dyn Router> = Box::new(DijkstraRouter);
        let action_table = build_action_table(&self.config.actions, &self.admission);
        let action_executor = ActionExecutor::new(action_table, &self.maps, self.config.grid);
        let simulator = CharacterSimulator::new(self.maps.clone(), router, self.config.movement_speed);

        let mut defaults: HashMap<CharacterId, Vec<ts_schedule::ScheduleEntry>> = HashMap::new();
        for entry in &self.character_bundle {
            defaults.insert(entry.id.clone(), entry.default_schedule.clone());
        }
        let schedule_manager = ScheduleManager::new(defaults);

        let clock = WorldClock::new(server_start_time, parse_timezone(&self.config.timezone));
        let time_manager = TimeManager::new(clock, now);

        let behavior_decider = Arc::new(BehaviorDecider::new(Some(Arc::clone(&self.llm))));
        let conversation_manager = ConversationManager::new();
        let turn_interval = Duration::from_millis(self.config.timing.turn_interval_ms);
        let (conversation_executor, conversation_rx) =
            ConversationExecutor::new(Arc::clone(&self.llm), turn_interval, CONVERSATION_CHANNEL_CAPACITY);

        world.set_time(world.time());
        let idle_ids: Vec<CharacterId> = world
            .characters()
            .filter(|c| c.can_start_new_action())
            .map(|c| c.id.clone())
            .collect();

        let mut engine = Engine::assemble(
            self.config,
            world,
            simulator,
            action_executor,
            time_manager,
            schedule_manager,
            behavior_decider,
            conversation_manager,
            conversation_executor,
            conversation_rx,
            self.store,
            now,
        );

        for id in idle_ids {
            engine.dispatch_decision(&id, now, None)?;
        }

        Ok(engine)
    }
}

fn fresh_character(entry: &CharacterBundleEntry) -> ts_world::Character {
    ts_world::Character {
        id: entry.id.clone(),
        name: entry.name.clone(),
        sprite: entry.sprite.clone(),
        money: entry.money,
        stats: ts_core::Stats::default(),
        current_map_id: entry.current_map_id.clone(),
        current_node_id: entry.current_node_id.clone(),
        position: entry.position,
        direction: entry.direction,
        employment: entry.job_id.clone().map(|job_id| ts_world::Employment { job_id }),
        profile: entry.profile.clone(),
        navigation: ts_world::NavigationState::idle(),
        cross_map_navigation: ts_world::CrossMapNav::idle(),
        transition: None,
        conversation: None,
        current_action: None,
        pending_action: None,
        action_counter: 0,
        display_emoji: None,
    }
}
