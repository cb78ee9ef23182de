//! Engine-level integration tests: boot a tiny one-map world with a
//! never-available LLM client (rules fallback only, spec.md §4.7) and
//! drive it through `tick` the way `demos/townsim-demo` does, checking the
//! cross-crate invariants the individual `ts-*` crates can't see on their
//! own — decay actually running end to end, a restart restoring state, a
//! status interrupt reaching the action executor.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use ts_behavior::{BehaviorResult, GenerateObjectRequest, LLMClient};
use ts_core::{ActionConfig, ActionId, CharacterId, FacilityId, GridDefaults, MapId, NodeId, StatDelta, TimingConfig, WorldConfig};
use ts_persistence::{InMemoryStore, StateStore};
use ts_schedule::ScheduleEntry;
use ts_spatial::{Direction, Map, Node, NodeKind, Position};

use crate::bootstrap::EngineBuilder;
use crate::bundle::{ActionAdmissionEntry, CharacterBundleEntry, NpcBundleEntry};
use crate::callbacks::NoopObserver;

/// Never available — every decision in these tests goes through
/// `BehaviorDecider`'s rules fallback, never an actual LLM round-trip.
struct NullLlmClient;

#[async_trait]
impl LLMClient for NullLlmClient {
    async fn generate_object(&self, _request: GenerateObjectRequest) -> BehaviorResult<serde_json::Value> {
        unreachable!("is_available() is false, this is never called")
    }

    fn is_available(&self) -> bool {
        false
    }
}

fn two_node_map() -> Map {
    let gate = NodeId::new("gate");
    let bench = NodeId::new("bench");
    let mut nodes = HashMap::new();
    nodes.insert(
        gate.clone(),
        Node {
            id: gate.clone(),
            x: 0.0,
            y: 0.0,
            kind: NodeKind::Spawn,
            connected_to: HashSet::from([bench.clone()]),
            leads_to: None,
            label: None,
        },
    );
    nodes.insert(
        bench.clone(),
        Node {
            id: bench.clone(),
            x: 64.0,
            y: 0.0,
            kind: NodeKind::Waypoint,
            connected_to: HashSet::from([gate.clone()]),
            leads_to: None,
            label: None,
        },
    );
    Map {
        id: MapId::new("yard"),
        width: 128,
        height: 64,
        background_color: "#222222".to_string(),
        spawn_node_id: gate,
        nodes,
        obstacles: Vec::new(),
    }
}

fn base_config() -> WorldConfig {
    let mut actions = HashMap::new();
    let mut effects = HashMap::new();
    effects.insert("mood".to_string(), StatDelta::Amount(5.0));
    actions.insert(ActionId::new("rest"), ActionConfig::Fixed { duration_minutes: 5, effects });

    WorldConfig {
        grid: GridDefaults::default(),
        timing: TimingConfig { turn_interval_ms: 0, save_interval_ticks: 0, ..Default::default() },
        movement_speed: 48.0,
        decay_rates: ts_core::DecayRates::default(),
        timezone: "UTC".to_string(),
        actions,
    }
}

fn character_bundle() -> CharacterBundleEntry {
    CharacterBundleEntry {
        id: CharacterId::new("alice"),
        name: "Alice".to_string(),
        sprite: serde_json::Value::Null,
        money: 0,
        current_map_id: MapId::new("yard"),
        current_node_id: NodeId::new("gate"),
        position: Position::new(0.0, 0.0),
        direction: Direction::Down,
        job_id: None,
        profile: None,
        default_schedule: vec![ScheduleEntry {
            time: "00:00".to_string(),
            activity: ActionId::new("rest"),
            facility_id: None::<FacilityId>,
            reason: Some("scheduled rest".to_string()),
        }],
    }
}

fn npc_bundle() -> NpcBundleEntry {
    NpcBundleEntry {
        id: ts_core::NpcId::new("mira"),
        name: "Mira".to_string(),
        map_id: MapId::new("yard"),
        node_id: NodeId::new("bench"),
        position: Position::new(64.0, 0.0),
        facts: Vec::new(),
    }
}

fn maps() -> HashMap<MapId, Map> {
    let map = two_node_map();
    let mut maps = HashMap::new();
    maps.insert(map.id.clone(), map);
    maps
}

#[tokio::test]
async fn boot_seeds_a_fresh_world_and_runs_ticks() {
    let store = Arc::new(InMemoryStore::new());
    let llm: Arc<dyn LLMClient> = Arc::new(NullLlmClient);

    let mut engine = EngineBuilder::new(base_config(), maps(), vec![character_bundle()], vec![npc_bundle()], store, llm)
        .admission(HashMap::<ActionId, ActionAdmissionEntry>::new())
        .build(Utc::now())
        .expect("fresh boot should succeed");

    let mut observer = NoopObserver;
    for _ in 0..10 {
        engine.tick(&mut observer).await.expect("tick should not error");
    }

    let snapshot = engine.observable_snapshot();
    assert_eq!(snapshot.characters.len(), 1);
    assert_eq!(snapshot.npcs.len(), 1);
    let alice = &snapshot.characters[&CharacterId::new("alice")];
    assert_eq!(alice.current_map_id, MapId::new("yard"));
    for stat in [alice.stats.satiety, alice.stats.bladder, alice.stats.energy, alice.stats.hygiene, alice.stats.mood] {
        assert!((0.0..=100.0).contains(&stat), "stat out of clamp range: {stat}");
    }
}

#[tokio::test]
async fn decay_runs_without_wall_clock_sleep() {
    let store = Arc::new(InMemoryStore::new());
    let llm: Arc<dyn LLMClient> = Arc::new(NullLlmClient);

    let mut engine = EngineBuilder::new(base_config(), maps(), vec![character_bundle()], vec![npc_bundle()], store, llm)
        .admission(HashMap::<ActionId, ActionAdmissionEntry>::new())
        .build(Utc::now())
        .expect("fresh boot should succeed");

    let initial = engine.observable_snapshot().characters[&CharacterId::new("alice")].stats;

    let mut observer = NoopObserver;
    for _ in 0..5 {
        engine.tick(&mut observer).await.unwrap();
    }

    let after = engine.observable_snapshot().characters[&CharacterId::new("alice")].stats;
    // Wall-clock elapsed between these ticks is whatever real time passed
    // running the test (could be ~0ms); we only assert stats never moved
    // the wrong direction or escaped their clamp, since `TimeManager`
    // measures real elapsed minutes rather than a fixed per-tick step.
    assert!(after.satiety <= initial.satiety + 0.001);
    assert!(after.bladder <= initial.bladder + 0.001);
    assert!((0.0..=100.0).contains(&after.satiety));
}

#[tokio::test]
async fn save_then_restore_round_trips_character_position() {
    let store = Arc::new(InMemoryStore::new());
    let llm: Arc<dyn LLMClient> = Arc::new(NullLlmClient);

    let now = Utc::now();
    let mut engine = EngineBuilder::new(base_config(), maps(), vec![character_bundle()], vec![npc_bundle()], Arc::clone(&store), Arc::clone(&llm))
        .admission(HashMap::<ActionId, ActionAdmissionEntry>::new())
        .build(now)
        .expect("fresh boot should succeed");

    let mut observer = NoopObserver;
    for _ in 0..3 {
        engine.tick(&mut observer).await.unwrap();
    }
    engine.save_now().expect("save should succeed");

    let restored = EngineBuilder::new(base_config(), maps(), vec![character_bundle()], vec![npc_bundle()], store, llm)
        .admission(HashMap::<ActionId, ActionAdmissionEntry>::new())
        .build(now)
        .expect("restore boot should succeed");

    let before = engine.observable_snapshot();
    let after = restored.observable_snapshot();
    let alice_before = &before.characters[&CharacterId::new("alice")];
    let alice_after = &after.characters[&CharacterId::new("alice")];
    assert_eq!(alice_before.current_map_id, alice_after.current_map_id);
    assert_eq!(alice_before.current_node_id, alice_after.current_node_id);
    assert!((alice_before.stats.satiety - alice_after.stats.satiety).abs() < 0.01);

    // Runtime-only fields are not persisted: a restored character starts
    // idle regardless of what it was doing when it was saved (spec.md §7).
    assert!(alice_after.current_action_id.is_none());
}

#[tokio::test]
async fn server_start_time_survives_restart() {
    let store = Arc::new(InMemoryStore::new());
    let llm: Arc<dyn LLMClient> = Arc::new(NullLlmClient);
    let now = Utc::now();

    let _engine = EngineBuilder::new(base_config(), maps(), vec![character_bundle()], vec![npc_bundle()], Arc::clone(&store), Arc::clone(&llm))
        .admission(HashMap::<ActionId, ActionAdmissionEntry>::new())
        .build(now)
        .expect("fresh boot should succeed");

    let first_start = store.load_server_start_time().unwrap().expect("server start time should be stamped");

    let later = now + chrono::Duration::seconds(60);
    let _restarted = EngineBuilder::new(base_config(), maps(), vec![character_bundle()], vec![npc_bundle()], Arc::clone(&store), llm)
        .admission(HashMap::<ActionId, ActionAdmissionEntry>::new())
        .build(later)
        .expect("restore boot should succeed");

    let second_start = store.load_server_start_time().unwrap().expect("server start time should still be there");
    assert_eq!(first_start, second_start, "restart must not re-stamp serverStartTime (spec.md §10 sticky day count)");
}
