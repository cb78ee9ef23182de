use ts_core::{ActionId, CharacterId, MapId, NodeId, NpcId, Stats};
use ts_spatial::{Direction, Position};

use crate::character::{ActionState, Character, NavigationState};
use crate::npc::Npc;
use crate::world::WorldState;
use chrono::Utc;

fn sample_character(id: &str) -> Character {
    Character {
        id: CharacterId::new(id),
        name: id.to_string(),
        sprite: serde_json::Value::Null,
        money: 0,
        stats: Stats::default(),
        current_map_id: MapId::new("house"),
        current_node_id: NodeId::new("bed"),
        position: Position { x: 0.0, y: 0.0 },
        direction: Direction::Down,
        employment: None,
        profile: None,
        navigation: NavigationState::idle(),
        cross_map_navigation: Default::default(),
        transition: None,
        conversation: None,
        current_action: None,
        pending_action: None,
        action_counter: 0,
        display_emoji: None,
    }
}

#[test]
fn add_then_get_character_round_trips() {
    let mut world = WorldState::new();
    world.add_character(sample_character("alice")).unwrap();
    let found = world.get_character(&CharacterId::new("alice")).unwrap();
    assert_eq!(found.name, "alice");
}

#[test]
fn adding_duplicate_character_id_is_rejected() {
    let mut world = WorldState::new();
    world.add_character(sample_character("alice")).unwrap();
    let err = world.add_character(sample_character("alice")).unwrap_err();
    assert!(matches!(err, crate::error::WorldError::CharacterAlreadyExists(_)));
}

#[test]
fn navigation_requires_at_least_two_path_nodes() {
    let id = CharacterId::new("alice");
    let mut world = WorldState::new();
    world.add_character(sample_character("alice")).unwrap();

    let bad = NavigationState {
        is_moving: true,
        path: vec![NodeId::new("a")],
        current_path_index: 0,
        progress: 0.0,
        start_position: Position { x: 0.0, y: 0.0 },
        target_position: Position { x: 1.0, y: 1.0 },
    };
    assert!(!bad.is_valid());
    world.start_navigation(&id, bad).unwrap();
    assert!(!world.get_character(&id).unwrap().invariants_hold());
}

#[test]
fn current_action_excludes_moving_and_conversation() {
    let id = CharacterId::new("alice");
    let mut world = WorldState::new();
    world.add_character(sample_character("alice")).unwrap();

    let now = Utc::now();
    world
        .set_current_action(
            &id,
            Some(ActionState {
                action_id: ActionId::new("eat"),
                start_time: now,
                target_end_time: now,
                facility_id: None,
                target_npc_id: None,
                duration_minutes: Some(10),
                reason: None,
            }),
        )
        .unwrap();
    assert!(world.get_character(&id).unwrap().invariants_hold());

    let moving = NavigationState {
        is_moving: true,
        path: vec![NodeId::new("a"), NodeId::new("b")],
        current_path_index: 0,
        progress: 0.0,
        start_position: Position { x: 0.0, y: 0.0 },
        target_position: Position { x: 1.0, y: 1.0 },
    };
    world.start_navigation(&id, moving).unwrap();
    assert!(!world.get_character(&id).unwrap().invariants_hold());
}

#[test]
fn can_start_new_action_is_false_while_moving_converting_or_transitioning() {
    use crate::character::{ConversationRef, TransitionPhase, TransitionState};

    let mut character = sample_character("alice");
    assert!(character.can_start_new_action(), "idle character should be eligible for a decision");

    character.navigation = NavigationState {
        is_moving: true,
        path: vec![NodeId::new("a"), NodeId::new("b")],
        current_path_index: 0,
        progress: 0.2,
        start_position: Position { x: 0.0, y: 0.0 },
        target_position: Position { x: 1.0, y: 1.0 },
    };
    assert!(!character.can_start_new_action(), "mid-walk character must not be offered a new decision");
    character.navigation = NavigationState::idle();

    character.conversation = Some(ConversationRef { session_id: ts_core::SessionId::new("s1"), npc_id: NpcId::new("baker") });
    assert!(!character.can_start_new_action(), "conversing character must not be offered a new decision");
    character.conversation = None;

    character.transition = Some(TransitionState {
        phase: TransitionPhase::FadeOut,
        from_map_id: MapId::new("town"),
        to_map_id: MapId::new("cafe"),
        to_node_id: NodeId::new("cafe-entrance"),
        to_position: Position { x: 0.0, y: 0.0 },
        progress: 0.1,
    });
    assert!(!character.can_start_new_action(), "mid-transition character must not be offered a new decision");
}

#[test]
fn advancing_navigation_without_starting_one_fails() {
    let id = CharacterId::new("alice");
    let mut world = WorldState::new();
    world.add_character(sample_character("alice")).unwrap();
    let err = world.advance_navigation(&id, NavigationState::idle()).unwrap_err();
    assert!(matches!(err, crate::error::WorldError::NoActiveNavigation(_)));
}

#[test]
fn npc_affinity_round_trips_through_conversation_flag() {
    let npc_id = NpcId::new("shopkeeper");
    let mut world = WorldState::new();
    world.add_npc(Npc::new(
        npc_id.clone(),
        "Shopkeeper",
        MapId::new("shop"),
        NodeId::new("counter"),
        Position { x: 3.0, y: 2.0 },
    ));

    assert!(!world.get_npc_conversation_flag(&npc_id).unwrap());
    world.set_npc_conversation_flag(&npc_id, true).unwrap();
    assert!(world.get_npc_conversation_flag(&npc_id).unwrap());
}

#[test]
fn snapshot_is_a_deep_copy_independent_of_later_mutation() {
    let id = CharacterId::new("alice");
    let mut world = WorldState::new();
    world.add_character(sample_character("alice")).unwrap();

    let snapshot = world.serialized_state();
    world.set_position(&id, Position { x: 9.0, y: 9.0 }).unwrap();

    let snapshotted = snapshot.characters.get(&id).unwrap();
    assert_eq!(snapshotted.position, Position { x: 0.0, y: 0.0 });
    assert_eq!(world.get_character(&id).unwrap().position, Position { x: 9.0, y: 9.0 });
}

#[test]
fn action_epoch_increments_monotonically() {
    let id = CharacterId::new("alice");
    let mut world = WorldState::new();
    world.add_character(sample_character("alice")).unwrap();

    let first = world.next_action_epoch(&id).unwrap();
    let second = world.next_action_epoch(&id).unwrap();
    assert_eq!(second, first + 1);
}

#[test]
fn pausing_is_a_pure_flag_flip() {
    let mut world = WorldState::new();
    assert!(!world.is_paused());
    world.pause();
    assert!(world.is_paused());
    world.resume();
    assert!(!world.is_paused());
}
