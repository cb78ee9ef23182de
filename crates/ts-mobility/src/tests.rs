//! Scenario tests drawn from spec.md §8 (S1, S2) plus FSM unit tests.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use ts_core::{CharacterId, MapId, NodeId, Stats};
use ts_spatial::{Direction, DijkstraRouter, Map, Node, NodeKind, Position};
use ts_world::{Character, WorldState};

use crate::event::MobilityEvent;
use crate::simulator::CharacterSimulator;

fn node(id: &str, x: f32, y: f32, kind: NodeKind, edges: &[&str], leads_to: Option<(&str, &str)>) -> Node {
    Node {
        id: NodeId::new(id),
        x,
        y,
        kind,
        connected_to: edges.iter().map(|e| NodeId::new(*e)).collect(),
        leads_to: leads_to.map(|(m, n)| (MapId::new(m), NodeId::new(n))),
        label: None,
    }
}

fn sample_character(id: &str, map_id: &str, node_id: &str, position: Position) -> Character {
    Character {
        id: CharacterId::new(id),
        name: id.to_string(),
        sprite: serde_json::Value::Null,
        money: 0,
        stats: Stats::default(),
        current_map_id: MapId::new(map_id),
        current_node_id: NodeId::new(node_id),
        position,
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

/// Spec.md §8 S1: 3x3 grid, prefix `town`, blocked node `town-0-1`.
fn town_grid() -> Map {
    let mut nodes = HashMap::new();
    for x in 0..3 {
        for y in 0..3 {
            let id = format!("town-{x}-{y}");
            let mut edges = Vec::new();
            for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1), (-1, -1), (1, -1), (-1, 1), (1, 1)] {
                let (nx, ny) = (x + dx, y + dy);
                if (0..3).contains(&nx) && (0..3).contains(&ny) {
                    edges.push(format!("town-{nx}-{ny}"));
                }
            }
            let edge_refs: Vec<&str> = edges.iter().map(|s| s.as_str()).collect();
            nodes.insert(
                NodeId::new(id.as_str()),
                node(&id, x as f32 * 32.0, y as f32 * 32.0, NodeKind::Waypoint, &edge_refs, None),
            );
        }
    }
    Map {
        id: MapId::new("town"),
        width: 3,
        height: 3,
        background_color: "#fff".into(),
        spawn_node_id: NodeId::new("town-0-0"),
        nodes,
        obstacles: vec![],
    }
}

#[test]
fn s1_grid_pathing_with_blocked_node() {
    let map = town_grid();
    let mut maps = HashMap::new();
    maps.insert(map.id.clone(), map);
    let sim = CharacterSimulator::new(maps, Box::new(DijkstraRouter), 96.0);

    let mut world = WorldState::new();
    let char_id = CharacterId::new("alice");
    world.add_character(sample_character("alice", "town", "town-0-0", Position::new(0.0, 0.0))).unwrap();

    let mut blocked = HashSet::new();
    blocked.insert(NodeId::new("town-0-1"));

    let started = sim
        .navigate_to_node_blocked(&mut world, &char_id, NodeId::new("town-0-2"), &blocked)
        .unwrap();
    assert!(started);

    let path = world.get_character(&char_id).unwrap().navigation.path.clone();
    assert!(!path.contains(&NodeId::new("town-0-1")), "blocked node must not appear in the path");

    for _ in 0..200 {
        sim.tick(&mut world, 0.2, Utc::now()).unwrap();
        if !world.get_character(&char_id).unwrap().navigation.is_moving {
            break;
        }
    }

    let character = world.get_character(&char_id).unwrap();
    assert_eq!(character.current_node_id, NodeId::new("town-0-2"));
    assert!(!character.navigation.is_moving);
}

/// Spec.md §8 S2: map transition through a symmetric entrance pair.
fn town_and_cafe() -> HashMap<MapId, Map> {
    let town_entrance = node(
        "town-entrance",
        200.0,
        100.0,
        NodeKind::Entrance,
        &["town-start"],
        Some(("cafe", "cafe-entrance")),
    );
    let town_start = node("town-start", 100.0, 100.0, NodeKind::Waypoint, &["town-entrance"], None);
    let mut town_nodes = HashMap::new();
    town_nodes.insert(town_entrance.id.clone(), town_entrance);
    town_nodes.insert(town_start.id.clone(), town_start);
    let town = Map {
        id: MapId::new("town"),
        width: 3,
        height: 3,
        background_color: "#fff".into(),
        spawn_node_id: NodeId::new("town-start"),
        nodes: town_nodes,
        obstacles: vec![],
    };

    let cafe_entrance = node("cafe-entrance", 100.0, 100.0, NodeKind::Entrance, &[], Some(("town", "town-entrance")));
    let mut cafe_nodes = HashMap::new();
    cafe_nodes.insert(cafe_entrance.id.clone(), cafe_entrance);
    let cafe = Map {
        id: MapId::new("cafe"),
        width: 2,
        height: 2,
        background_color: "#fff".into(),
        spawn_node_id: NodeId::new("cafe-entrance"),
        nodes: cafe_nodes,
        obstacles: vec![],
    };

    let mut maps = HashMap::new();
    maps.insert(town.id.clone(), town);
    maps.insert(cafe.id.clone(), cafe);
    maps
}

#[test]
fn s2_map_transition_through_entrance() {
    let maps = town_and_cafe();
    let sim = CharacterSimulator::new(maps, Box::new(DijkstraRouter), 96.0);

    let mut world = WorldState::new();
    let char_id = CharacterId::new("alice");
    world
        .add_character(sample_character("alice", "town", "town-start", Position::new(100.0, 100.0)))
        .unwrap();

    let started = sim.navigate_to_node(&mut world, &char_id, NodeId::new("town-entrance")).unwrap();
    assert!(started);

    // 1.1s: long enough (at 96px/s over 100px) to finish walking and start
    // the transition's fadeOut phase.
    sim.tick(&mut world, 1.1, Utc::now()).unwrap();
    assert!(world.get_character(&char_id).unwrap().transition.is_some());

    // Two more 0.6s ticks (total fade progress 1.2 > the 0.5s-per-phase
    // fadeOut+fadeIn budget) finish the whole FSM.
    sim.tick(&mut world, 0.6, Utc::now()).unwrap();
    let events = sim.tick(&mut world, 0.6, Utc::now()).unwrap();

    let character = world.get_character(&char_id).unwrap();
    assert_eq!(character.current_map_id, MapId::new("cafe"));
    assert_eq!(character.current_node_id, NodeId::new("cafe-entrance"));
    assert!(character.transition.is_none());
    assert!(events.contains(&MobilityEvent::NavigationComplete(char_id.clone())));
}

#[test]
fn navigate_to_node_already_there_is_a_trivial_success() {
    let map = town_grid();
    let mut maps = HashMap::new();
    maps.insert(map.id.clone(), map);
    let sim = CharacterSimulator::new(maps, Box::new(DijkstraRouter), 96.0);

    let mut world = WorldState::new();
    let char_id = CharacterId::new("alice");
    world.add_character(sample_character("alice", "town", "town-1-1", Position::new(32.0, 32.0))).unwrap();

    let result = sim.navigate_to_node(&mut world, &char_id, NodeId::new("town-1-1")).unwrap();
    assert!(result);
    assert!(!world.get_character(&char_id).unwrap().navigation.is_moving);
}

#[test]
fn navigate_to_node_fails_while_already_moving() {
    let map = town_grid();
    let mut maps = HashMap::new();
    maps.insert(map.id.clone(), map);
    let sim = CharacterSimulator::new(maps, Box::new(DijkstraRouter), 96.0);

    let mut world = WorldState::new();
    let char_id = CharacterId::new("alice");
    world.add_character(sample_character("alice", "town", "town-0-0", Position::new(0.0, 0.0))).unwrap();

    assert!(sim.navigate_to_node(&mut world, &char_id, NodeId::new("town-2-2")).unwrap());
    let second = sim.navigate_to_node(&mut world, &char_id, NodeId::new("town-0-2")).unwrap();
    assert!(!second);
}

#[test]
fn unreachable_target_returns_false() {
    let mut nodes = HashMap::new();
    nodes.insert(NodeId::new("a"), node("a", 0.0, 0.0, NodeKind::Waypoint, &[], None));
    nodes.insert(NodeId::new("b"), node("b", 10.0, 0.0, NodeKind::Waypoint, &[], None));
    let map = Map {
        id: MapId::new("island"),
        width: 1,
        height: 1,
        background_color: "#fff".into(),
        spawn_node_id: NodeId::new("a"),
        nodes,
        obstacles: vec![],
    };
    let mut maps = HashMap::new();
    maps.insert(map.id.clone(), map);
    let sim = CharacterSimulator::new(maps, Box::new(DijkstraRouter), 96.0);

    let mut world = WorldState::new();
    let char_id = CharacterId::new("alice");
    world.add_character(sample_character("alice", "island", "a", Position::new(0.0, 0.0))).unwrap();

    let result = sim.navigate_to_node(&mut world, &char_id, NodeId::new("b")).unwrap();
    assert!(!result);
}
