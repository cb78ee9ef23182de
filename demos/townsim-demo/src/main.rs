//! townsim-demo — smallest fixture for the townsim simulation engine.
//!
//! Boots a one-map, one-character, one-NPC world with no LLM backing
//! (rules fallback only), runs it for a fixed number of ticks, and prints
//! the resulting stat decay and action history to stdout. Swap
//! `NullLlmClient` for a real `LLMClient` implementation to exercise the
//! scheduled-decision and conversation paths.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use ts_behavior::{GenerateObjectRequest, LLMClient};
use ts_core::{
    ActionConfig, ActionId, CharacterId, FacilityId, GridDefaults, MapId, NodeId, NpcId, StatDelta, WorldConfig,
};
use ts_engine::{ActionAdmissionEntry, CharacterBundleEntry, EngineBuilder, EngineObserver, NoopObserver, NpcBundleEntry};
use ts_persistence::InMemoryStore;
use ts_schedule::ScheduleEntry;
use ts_spatial::{Direction, Map, Node, NodeKind, Position};

const TICK_COUNT: u32 = 30;

/// A `LLMClient` that is never available — every decision this demo makes
/// goes through `BehaviorDecider`'s rules fallback (spec.md §4.7).
struct NullLlmClient;

#[async_trait]
impl LLMClient for NullLlmClient {
    async fn generate_object(&self, _request: GenerateObjectRequest) -> ts_behavior::BehaviorResult<serde_json::Value> {
        unreachable!("is_available() is false, this is never called")
    }

    fn is_available(&self) -> bool {
        false
    }
}

fn build_map() -> Map {
    let bench = NodeId::new("bench");
    let gate = NodeId::new("gate");

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
            label: Some("gate".to_string()),
        },
    );
    nodes.insert(
        bench.clone(),
        Node {
            id: bench.clone(),
            x: 96.0,
            y: 0.0,
            kind: NodeKind::Waypoint,
            connected_to: HashSet::from([gate.clone()]),
            leads_to: None,
            label: Some("bench".to_string()),
        },
    );

    Map {
        id: MapId::new("courtyard"),
        width: 128,
        height: 64,
        background_color: "#3a6b35".to_string(),
        spawn_node_id: gate,
        nodes,
        obstacles: Vec::new(),
    }
}

fn build_config() -> WorldConfig {
    let mut actions = HashMap::new();
    let mut effects = HashMap::new();
    effects.insert("mood".to_string(), StatDelta::Amount(8.0));
    actions.insert(ActionId::new("rest"), ActionConfig::Fixed { duration_minutes: 5, effects });

    WorldConfig {
        grid: GridDefaults::default(),
        timing: ts_core::TimingConfig { turn_interval_ms: 0, save_interval_ticks: 0, ..Default::default() },
        movement_speed: 48.0,
        decay_rates: ts_core::DecayRates::default(),
        timezone: "UTC".to_string(),
        actions,
    }
}

/// An `EngineObserver` that logs every notification to `tracing`, the way a
/// headless server would before handing events to a websocket broadcaster.
struct LoggingObserver;

impl EngineObserver for LoggingObserver {
    fn on_tick_start(&mut self, tick: u64) {
        info!(tick, "tick start");
    }

    fn on_action_start(&mut self, character_id: &CharacterId, action_id: &ActionId) {
        info!(%character_id, %action_id, "action started");
    }

    fn on_action_complete(&mut self, character_id: &CharacterId, action_id: &ActionId) {
        info!(%character_id, %action_id, "action completed");
    }

    fn on_navigation_complete(&mut self, character_id: &CharacterId) {
        info!(%character_id, "navigation complete");
    }

    fn on_status_interrupt(&mut self, character_id: &CharacterId, stat: ts_core::StatusType) {
        info!(%character_id, %stat, "status interrupt");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    println!("=== townsim-demo — townsim engine ===");
    println!("Ticks: {TICK_COUNT}");
    println!();

    let map = build_map();
    let mut maps = HashMap::new();
    let courtyard_id = map.id.clone();
    maps.insert(courtyard_id.clone(), map);

    let character = CharacterBundleEntry {
        id: CharacterId::new("alice"),
        name: "Alice".to_string(),
        sprite: serde_json::Value::Null,
        money: 0,
        current_map_id: courtyard_id.clone(),
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
    };

    let npc = NpcBundleEntry {
        id: NpcId::new("mira"),
        name: "Mira".to_string(),
        map_id: courtyard_id.clone(),
        node_id: NodeId::new("bench"),
        position: Position::new(96.0, 0.0),
        facts: vec!["runs the flower stall".to_string()],
    };

    let store = Arc::new(InMemoryStore::new());
    let llm: Arc<dyn LLMClient> = Arc::new(NullLlmClient);

    let mut engine = EngineBuilder::new(build_config(), maps, vec![character], vec![npc], store, llm)
        .admission(HashMap::<ActionId, ActionAdmissionEntry>::new())
        .build(chrono::Utc::now())?;

    let mut observer = LoggingObserver;
    for _ in 0..TICK_COUNT {
        engine.tick(&mut observer).await?;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    engine.save_now()?;

    let snapshot = engine.observable_snapshot();
    println!();
    println!("Final world state at tick {}:", snapshot.tick);
    for (id, character) in &snapshot.characters {
        println!(
            "  {id}: map={} node={} stats=(satiety {:.1}, bladder {:.1}, energy {:.1}, hygiene {:.1}, mood {:.1})",
            character.current_map_id,
            character.current_node_id,
            character.stats.satiety,
            character.stats.bladder,
            character.stats.energy,
            character.stats.hygiene,
            character.stats.mood,
        );
    }

    let mut noop = NoopObserver;
    engine.tick(&mut noop).await?;

    Ok(())
}
