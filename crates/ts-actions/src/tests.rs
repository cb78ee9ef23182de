use std::collections::{HashMap, HashSet};

use chrono::{TimeZone, Utc};
use ts_core::{ActionConfig, ActionId, CharacterId, FacilityId, GridDefaults, JobId, MapId, NodeId, NpcId, Stats, WorldTime};
use ts_spatial::{Direction, Facility, Job, Map, Node, NodeKind, Obstacle, ObstacleKind, Position, TileBounds, WorkHours};
use ts_world::{Character, Npc, WorldState};

use crate::definition::ActionDef;
use crate::executor::{ActionExecutor, StartActionArgs};

fn grid() -> GridDefaults {
    GridDefaults { cell_width: 32.0, cell_height: 32.0 }
}

fn node(id: &str, x: f32, y: f32) -> Node {
    Node { id: NodeId::new(id), x, y, kind: NodeKind::Waypoint, connected_to: HashSet::new(), leads_to: None, label: None }
}

fn sample_character(id: &str, node_id: &str) -> Character {
    Character {
        id: CharacterId::new(id),
        name: id.to_string(),
        sprite: serde_json::Value::Null,
        money: 100,
        stats: Stats::default(),
        current_map_id: MapId::new("town"),
        current_node_id: NodeId::new(node_id),
        position: Position::new(0.0, 0.0),
        direction: Direction::Down,
        employment: None,
        profile: None,
        navigation: ts_world::NavigationState::idle(),
        cross_map_navigation: Default::default(),
        transition: None,
        conversation: None,
        current_action: None,
        pending_action: None,
        action_counter: 0,
        display_emoji: None,
    }
}

/// A single-facility map: a `kitchen`-tagged building at tile (0,0), node
/// `a` inside it, node `b` outside at tile (2,0) (out of range).
fn map_with_kitchen() -> Map {
    let kitchen = Facility {
        id: FacilityId::new("kitchen-1"),
        tags: ["kitchen".to_string()].into_iter().collect(),
        owner: None,
        cost: None,
        job: None,
    };
    let obstacle = Obstacle {
        kind: ObstacleKind::Zone,
        bounds: TileBounds { x: 0, y: 0, width: 1, height: 1 },
        wall_sides: None,
        door: None,
        facility: Some(kitchen),
    };
    let mut nodes = HashMap::new();
    nodes.insert(NodeId::new("a"), node("a", 0.0, 0.0));
    nodes.insert(NodeId::new("b"), node("b", 64.0, 0.0));
    Map {
        id: MapId::new("town"),
        width: 3,
        height: 1,
        background_color: "#fff".into(),
        spawn_node_id: NodeId::new("a"),
        nodes,
        obstacles: vec![obstacle],
    }
}

fn map_with_job(start: u8, end: u8) -> Map {
    let job = Job { job_id: JobId::new("barista"), title: "Barista".into(), hourly_wage: 10.0, work_hours: WorkHours { start, end } };
    let facility = Facility {
        id: FacilityId::new("cafe-counter"),
        tags: ["counter".to_string()].into_iter().collect(),
        owner: None,
        cost: None,
        job: Some(job),
    };
    let obstacle = Obstacle {
        kind: ObstacleKind::Zone,
        bounds: TileBounds { x: 0, y: 0, width: 1, height: 1 },
        wall_sides: None,
        door: None,
        facility: Some(facility),
    };
    let mut nodes = HashMap::new();
    nodes.insert(NodeId::new("a"), node("a", 0.0, 0.0));
    Map {
        id: MapId::new("town"),
        width: 1,
        height: 1,
        background_color: "#fff".into(),
        spawn_node_id: NodeId::new("a"),
        nodes,
        obstacles: vec![obstacle],
    }
}

fn eat_def() -> ActionDef {
    let mut effects = HashMap::new();
    effects.insert("satiety".to_string(), ts_core::StatDelta::Amount(40.0));
    ActionDef {
        config: ActionConfig::Fixed { duration_minutes: 15, effects },
        required_facility_tags: vec!["kitchen".to_string()],
        requires_employment: false,
        requires_near_npc: false,
        emoji: Some("🍽".to_string()),
    }
}

fn work_def() -> ActionDef {
    let mut effects = HashMap::new();
    effects.insert("money".to_string(), ts_core::StatDelta::HourlyWage);
    ActionDef {
        config: ActionConfig::Fixed { duration_minutes: 60, effects },
        required_facility_tags: vec![],
        requires_employment: true,
        requires_near_npc: false,
        emoji: Some("💼".to_string()),
    }
}

fn defs(pairs: Vec<(&str, ActionDef)>) -> HashMap<ActionId, ActionDef> {
    pairs.into_iter().map(|(k, v)| (ActionId::new(k), v)).collect()
}

#[test]
fn admission_rejects_missing_facility_tag() {
    let map = map_with_kitchen();
    let mut maps = HashMap::new();
    maps.insert(map.id.clone(), map);
    let executor = ActionExecutor::new(defs(vec![("eat", eat_def())]), &maps, grid());

    let mut world = WorldState::new();
    let id = CharacterId::new("alice");
    world.add_character(sample_character("alice", "b")).unwrap();

    let result = executor.can_execute_action(&world, &id, &ActionId::new("eat"), false).unwrap();
    assert!(result.is_err());
}

#[test]
fn admission_accepts_accessible_facility_and_start_applies_effects() {
    let map = map_with_kitchen();
    let mut maps = HashMap::new();
    maps.insert(map.id.clone(), map);
    let executor = ActionExecutor::new(defs(vec![("eat", eat_def())]), &maps, grid());

    let mut world = WorldState::new();
    let id = CharacterId::new("alice");
    let mut character = sample_character("alice", "a");
    character.stats.satiety = 30.0;
    world.add_character(character).unwrap();

    let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
    let result = executor
        .start_action(&mut world, &id, &ActionId::new("eat"), StartActionArgs::default(), now)
        .unwrap();
    assert!(result.is_ok());

    let character = world.get_character(&id).unwrap();
    assert!(character.current_action.is_some());
    assert_eq!(character.display_emoji.as_deref(), Some("🍽"));

    let events = executor.complete_action(&mut world, &id).unwrap();
    assert_eq!(events.len(), 2);
    let character = world.get_character(&id).unwrap();
    assert!(character.current_action.is_none());
    assert_eq!(character.stats.satiety, 70.0);
}

#[test]
fn employment_gate_checks_job_match_and_work_hours() {
    let map = map_with_job(9, 17);
    let mut maps = HashMap::new();
    maps.insert(map.id.clone(), map);
    let executor = ActionExecutor::new(defs(vec![("work", work_def())]), &maps, grid());

    let mut world = WorldState::new();
    let id = CharacterId::new("bob");
    let mut character = sample_character("bob", "a");
    character.employment = Some(ts_world::Employment { job_id: JobId::new("barista") });
    world.add_character(character).unwrap();
    world.set_time(WorldTime { hour: 20, minute: 0, day: 1 });

    let rejected = executor.can_execute_action(&world, &id, &ActionId::new("work"), false).unwrap();
    assert!(rejected.is_err(), "20:00 is outside 09:00-17:00");

    world.set_time(WorldTime { hour: 10, minute: 0, day: 1 });
    let accepted = executor.can_execute_action(&world, &id, &ActionId::new("work"), false).unwrap();
    assert!(accepted.is_ok());
}

#[test]
fn overnight_work_hours_wrap_past_midnight() {
    let map = map_with_job(22, 6);
    let mut maps = HashMap::new();
    maps.insert(map.id.clone(), map);
    let executor = ActionExecutor::new(defs(vec![("work", work_def())]), &maps, grid());

    let mut world = WorldState::new();
    let id = CharacterId::new("bob");
    let mut character = sample_character("bob", "a");
    character.employment = Some(ts_world::Employment { job_id: JobId::new("barista") });
    world.add_character(character).unwrap();
    world.set_time(WorldTime { hour: 2, minute: 0, day: 1 });

    let accepted = executor.can_execute_action(&world, &id, &ActionId::new("work"), false).unwrap();
    assert!(accepted.is_ok(), "02:00 falls inside a 22:00-06:00 overnight shift");
}

#[test]
fn completing_work_pays_hourly_wage() {
    let map = map_with_job(0, 24);
    let mut maps = HashMap::new();
    maps.insert(map.id.clone(), map);
    let executor = ActionExecutor::new(defs(vec![("work", work_def())]), &maps, grid());

    let mut world = WorldState::new();
    let id = CharacterId::new("bob");
    let mut character = sample_character("bob", "a");
    character.employment = Some(ts_world::Employment { job_id: JobId::new("barista") });
    character.money = 0;
    world.add_character(character).unwrap();

    let now = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
    executor
        .start_action(
            &mut world,
            &id,
            &ActionId::new("work"),
            StartActionArgs { facility_id: Some(FacilityId::new("cafe-counter")), ..Default::default() },
            now,
        )
        .unwrap()
        .unwrap();

    executor.complete_action(&mut world, &id).unwrap();
    assert_eq!(world.get_character(&id).unwrap().money, 10);
}

#[test]
fn already_has_action_is_rejected_unless_ignored() {
    let map = map_with_kitchen();
    let mut maps = HashMap::new();
    maps.insert(map.id.clone(), map);
    let executor = ActionExecutor::new(defs(vec![("eat", eat_def())]), &maps, grid());

    let mut world = WorldState::new();
    let id = CharacterId::new("alice");
    world.add_character(sample_character("alice", "a")).unwrap();

    let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
    executor.start_action(&mut world, &id, &ActionId::new("eat"), StartActionArgs::default(), now).unwrap().unwrap();

    let second = executor.can_execute_action(&world, &id, &ActionId::new("eat"), false).unwrap();
    assert!(second.is_err());

    let ignored = executor.can_execute_action(&world, &id, &ActionId::new("eat"), true).unwrap();
    assert!(ignored.is_ok());
}

#[test]
fn thinking_never_auto_completes_on_tick() {
    let map = map_with_kitchen();
    let mut maps = HashMap::new();
    maps.insert(map.id.clone(), map);
    let thinking_def = ActionDef {
        config: ActionConfig::Fixed { duration_minutes: 0, effects: HashMap::new() },
        required_facility_tags: vec![],
        requires_employment: false,
        requires_near_npc: false,
        emoji: None,
    };
    let executor = ActionExecutor::new(defs(vec![("thinking", thinking_def)]), &maps, grid());

    let mut world = WorldState::new();
    let id = CharacterId::new("alice");
    world.add_character(sample_character("alice", "a")).unwrap();

    let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
    executor.start_action(&mut world, &id, &ActionId::new("thinking"), StartActionArgs::default(), now).unwrap().unwrap();

    let much_later = now + chrono::Duration::hours(5);
    let events = executor.tick(&mut world, much_later).unwrap();
    assert!(events.is_empty());
    assert!(world.get_character(&id).unwrap().current_action.is_some());

    executor.force_complete(&mut world, &id).unwrap();
    assert!(world.get_character(&id).unwrap().current_action.is_none());
}

#[test]
fn near_npc_requires_cardinal_adjacency_not_diagonal() {
    let mut nodes = HashMap::new();
    nodes.insert(NodeId::new("center"), node("center", 32.0, 32.0));
    nodes.insert(NodeId::new("cardinal"), node("cardinal", 32.0, 64.0));
    nodes.insert(NodeId::new("diagonal"), node("diagonal", 64.0, 64.0));
    let map = Map {
        id: MapId::new("town"),
        width: 3,
        height: 3,
        background_color: "#fff".into(),
        spawn_node_id: NodeId::new("center"),
        nodes,
        obstacles: vec![],
    };
    let mut maps = HashMap::new();
    maps.insert(map.id.clone(), map);

    let talk_def = ActionDef {
        config: ActionConfig::Fixed { duration_minutes: 0, effects: HashMap::new() },
        required_facility_tags: vec![],
        requires_employment: false,
        requires_near_npc: true,
        emoji: None,
    };
    let executor = ActionExecutor::new(defs(vec![("talk", talk_def)]), &maps, grid());

    let mut world = WorldState::new();
    let id = CharacterId::new("alice");
    world.add_character(sample_character("alice", "center")).unwrap();
    world.add_npc(Npc::new(NpcId::new("diag-npc"), "Diag", MapId::new("town"), NodeId::new("diagonal"), Position::new(64.0, 64.0)));

    let rejected = executor.can_execute_action(&world, &id, &ActionId::new("talk"), false).unwrap();
    assert!(rejected.is_err(), "a diagonal neighbor must not satisfy nearNpc");

    world.add_npc(Npc::new(NpcId::new("card-npc"), "Card", MapId::new("town"), NodeId::new("cardinal"), Position::new(32.0, 64.0)));
    let accepted = executor.can_execute_action(&world, &id, &ActionId::new("talk"), false).unwrap();
    assert!(accepted.is_ok());
}

#[test]
fn variable_duration_action_never_applies_effects_on_completion() {
    let map = map_with_kitchen();
    let mut maps = HashMap::new();
    maps.insert(map.id.clone(), map);
    let mut per_minute = HashMap::new();
    per_minute.insert("energy".to_string(), 2.0);
    let sleep_def = ActionDef {
        config: ActionConfig::Variable { duration_min: 60, duration_max: 600, duration_default: 480, per_minute },
        required_facility_tags: vec![],
        requires_employment: false,
        requires_near_npc: false,
        emoji: Some("😴".to_string()),
    };
    let executor = ActionExecutor::new(defs(vec![("sleep", sleep_def)]), &maps, grid());

    let mut world = WorldState::new();
    let id = CharacterId::new("alice");
    let mut character = sample_character("alice", "a");
    character.stats.energy = 20.0;
    world.add_character(character).unwrap();

    let now = Utc.with_ymd_and_hms(2026, 1, 1, 22, 0, 0).unwrap();
    executor.start_action(&mut world, &id, &ActionId::new("sleep"), StartActionArgs::default(), now).unwrap().unwrap();

    let active = executor.get_active_per_minute_effects(&world, &id).unwrap();
    assert_eq!(active.unwrap().get("energy"), Some(&2.0));

    executor.complete_action(&mut world, &id).unwrap();
    // energy is untouched here: it accrues through ts-time's decay pipeline,
    // never applied directly on completion.
    assert_eq!(world.get_character(&id).unwrap().stats.energy, 20.0);
}
