//! `CharacterSimulator` — per-tick position/direction interpolation and the
//! map-transition finite state machine (spec.md §4.3, component C3).

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use ts_core::{CharacterId, MapId, NodeId};
use ts_spatial::{plan_route, Direction, Map, NodeKind, Position, Router, RouteSegment};
use ts_world::{CrossMapNav, NavigationState, TransitionPhase, TransitionState, WorldState};

use crate::error::{MobilityError, MobilityResult};
use crate::event::MobilityEvent;

/// Progress gained per second during a map-transition fade phase —
/// `2.0 progress/sec`, i.e. each phase takes ~0.5s (spec.md §4.3).
const FADE_SPEED: f32 = 2.0;

/// Owns movement and map-transition logic for every character. Holds a
/// read-shared, immutable copy of every loaded map (spec.md §3: "Maps are
/// loaded once at boot and are immutable thereafter") and a pluggable
/// [`Router`] for within-map pathfinding.
pub struct CharacterSimulator {
    maps: HashMap<MapId, Map>,
    router: Box<dyn Router>,
    /// Pixels per second.
    movement_speed: f32,
}

impl CharacterSimulator {
    pub fn new(maps: HashMap<MapId, Map>, router: Box<dyn Router>, movement_speed: f32) -> Self {
        Self { maps, router, movement_speed }
    }

    pub fn map(&self, id: &MapId) -> Option<&Map> {
        self.maps.get(id)
    }

    /// Start a within-map path to `target`. Returns `true` if already at the
    /// node (a no-op "arrival"), `false` when already moving or the target
    /// is unreachable (spec.md §4.3 `navigateToNode`).
    pub fn navigate_to_node(
        &self,
        world: &mut WorldState,
        id: &CharacterId,
        target: NodeId,
    ) -> MobilityResult<bool> {
        self.navigate_to_node_blocked(world, id, target, &HashSet::new())
    }

    /// Same as [`Self::navigate_to_node`] with an explicit blocker set (NPCs,
    /// optionally other characters — spec.md §4.2).
    pub fn navigate_to_node_blocked(
        &self,
        world: &mut WorldState,
        id: &CharacterId,
        target: NodeId,
        blocked: &HashSet<NodeId>,
    ) -> MobilityResult<bool> {
        let character = world.get_character(id)?;
        if character.navigation.is_moving {
            return Ok(false);
        }
        if character.current_node_id == target {
            return Ok(true);
        }
        let map_id = character.current_map_id.clone();
        let from = character.current_node_id.clone();
        let map = self.maps.get(&map_id).ok_or_else(|| MobilityError::MapNotFound(map_id.clone()))?;

        let path = self.router.route(map, from, target, blocked)?;
        if path.is_empty() {
            return Ok(false);
        }

        let nav = nav_state_for_path(map, path, 1, character.position)?;
        world.start_navigation(id, nav)?;
        Ok(true)
    }

    /// Plan and start a cross-map route to `(map_id, node_id)`. Returns
    /// `false` when no route exists or the character is already moving
    /// (spec.md §4.3 `navigateToMap`).
    pub fn navigate_to_map(
        &self,
        world: &mut WorldState,
        id: &CharacterId,
        map_id: MapId,
        node_id: NodeId,
    ) -> MobilityResult<bool> {
        let character = world.get_character(id)?;
        if character.navigation.is_moving || character.cross_map_navigation.is_active {
            return Ok(false);
        }
        let from_map = character.current_map_id.clone();
        let from_node = character.current_node_id.clone();

        let route = match plan_route(&self.maps, self.router.as_ref(), &from_map, &from_node, &map_id, &node_id) {
            Ok(route) => route,
            Err(_) => return Ok(false),
        };
        if route.is_empty() {
            return Ok(false);
        }

        let cross_nav = CrossMapNav {
            is_active: true,
            target_map_id: Some(map_id),
            target_node_id: Some(node_id),
            route,
            current_segment_index: 0,
        };
        world.start_cross_map_nav(id, cross_nav)?;

        let first = world.get_character(id)?.cross_map_navigation.current_segment().cloned().expect("just started");
        self.begin_segment(world, id, &first)?;
        Ok(true)
    }

    /// Advance every character's movement/transition state by `delta_time`
    /// seconds, reporting the engine-facing events produced this tick
    /// (spec.md §4.3 "per-character tick"). `now` is accepted for parity
    /// with the spec's `tick(deltaTime, now)` signature; this crate's own
    /// logic is entirely delta-time-driven.
    pub fn tick(
        &self,
        world: &mut WorldState,
        delta_time: f64,
        now: DateTime<Utc>,
    ) -> MobilityResult<Vec<MobilityEvent>> {
        let _ = now;
        let ids: Vec<CharacterId> = world.character_ids().cloned().collect();
        let mut events = Vec::new();

        for id in ids {
            let character = world.get_character(&id)?;
            if character.transition.is_some() {
                if let Some(event) = self.advance_transition(world, &id, delta_time)? {
                    events.push(event);
                }
                continue;
            }
            if character.current_action.is_some() || character.conversation.is_some() {
                continue;
            }
            if character.navigation.is_moving {
                if let Some(event) = self.advance_navigation(world, &id, delta_time)? {
                    events.push(event);
                }
            }
        }

        Ok(events)
    }

    // ── Movement ──────────────────────────────────────────────────────────

    fn advance_navigation(
        &self,
        world: &mut WorldState,
        id: &CharacterId,
        delta_time: f64,
    ) -> MobilityResult<Option<MobilityEvent>> {
        let nav = world.get_character(id)?.navigation.clone();

        let segment_length = nav.start_position.distance(&nav.target_position);
        let delta_progress = if segment_length > f32::EPSILON {
            (delta_time as f32) * self.movement_speed / segment_length
        } else {
            1.0
        };
        let new_progress = (nav.progress + delta_progress).min(1.0);
        let position = lerp_position(nav.start_position, nav.target_position, new_progress);
        let direction = direction_between(nav.start_position, nav.target_position);

        world.set_position(id, position)?;
        world.set_direction(id, direction)?;

        if new_progress < 1.0 {
            let advanced = NavigationState { progress: new_progress, ..nav };
            world.advance_navigation(id, advanced)?;
            return Ok(None);
        }

        // Segment complete: arrived at `nav.path[nav.current_path_index]`.
        let arrived_node = nav.path[nav.current_path_index].clone();
        world.set_current_node(id, arrived_node.clone())?;

        if nav.current_path_index >= nav.path.len() - 1 {
            world.complete_navigation(id)?;
            self.handle_arrival(world, id)
        } else {
            let map_id = world.get_character(id)?.current_map_id.clone();
            let map = self.maps.get(&map_id).ok_or_else(|| MobilityError::MapNotFound(map_id.clone()))?;
            let next_index = nav.current_path_index + 1;
            let next_nav = nav_state_for_path(map, nav.path.clone(), next_index, nav.target_position)?;
            world.advance_navigation(id, next_nav)?;
            Ok(None)
        }
    }

    /// spec.md §4.3 "arrival handler".
    fn handle_arrival(&self, world: &mut WorldState, id: &CharacterId) -> MobilityResult<Option<MobilityEvent>> {
        let character = world.get_character(id)?;
        let map_id = character.current_map_id.clone();
        let node_id = character.current_node_id.clone();
        let cross_active = character.cross_map_navigation.is_active;

        let map = self.maps.get(&map_id).ok_or_else(|| MobilityError::MapNotFound(map_id.clone()))?;
        let node = map.nodes.get(&node_id).ok_or_else(|| MobilityError::NodeNotFound(node_id.clone(), map_id.clone()))?;

        let should_transition = node.kind == NodeKind::Entrance && (cross_active || node.leads_to.is_some());

        if should_transition {
            self.begin_transition(world, id)?;
            Ok(None)
        } else {
            Ok(Some(MobilityEvent::NavigationComplete(id.clone())))
        }
    }

    // ── Map-transition FSM ───────────────────────────────────────────────

    fn begin_segment(&self, world: &mut WorldState, id: &CharacterId, segment: &RouteSegment) -> MobilityResult<()> {
        if segment.is_pure_transition() {
            return self.begin_transition(world, id);
        }
        let map = self.maps.get(&segment.map_id).ok_or_else(|| MobilityError::MapNotFound(segment.map_id.clone()))?;
        let start_position = world.get_character(id)?.position;
        let nav = nav_state_for_path(map, segment.path.clone(), 1, start_position)?;
        world.start_navigation(id, nav)?;
        Ok(())
    }

    fn begin_transition(&self, world: &mut WorldState, id: &CharacterId) -> MobilityResult<()> {
        let character = world.get_character(id)?;
        let from_map_id = character.current_map_id.clone();
        let map_id = from_map_id.clone();
        let node_id = character.current_node_id.clone();

        let map = self.maps.get(&map_id).ok_or_else(|| MobilityError::MapNotFound(map_id.clone()))?;
        let node = map.nodes.get(&node_id).ok_or_else(|| MobilityError::NodeNotFound(node_id.clone(), map_id.clone()))?;
        let (to_map_id, to_node_id) = node
            .leads_to
            .clone()
            .ok_or_else(|| MobilityError::NoRoute {
                from_map: from_map_id.clone(),
                from_node: node_id.clone(),
                to_map: from_map_id.clone(),
                to_node: node_id.clone(),
            })?;

        let to_map = self.maps.get(&to_map_id).ok_or_else(|| MobilityError::MapNotFound(to_map_id.clone()))?;
        let to_position = to_map
            .nodes
            .get(&to_node_id)
            .ok_or_else(|| MobilityError::NodeNotFound(to_node_id.clone(), to_map_id.clone()))?
            .position();

        world.start_transition(
            id,
            TransitionState {
                phase: TransitionPhase::FadeOut,
                from_map_id,
                to_map_id,
                to_node_id,
                to_position,
                progress: 0.0,
            },
        )?;
        Ok(())
    }

    fn advance_transition(
        &self,
        world: &mut WorldState,
        id: &CharacterId,
        delta_time: f64,
    ) -> MobilityResult<Option<MobilityEvent>> {
        let transition = world.get_character(id)?.transition.clone().expect("checked by caller");

        let delta_progress = (delta_time as f32) * FADE_SPEED;
        let new_progress = (transition.progress + delta_progress).min(1.0);

        if new_progress < 1.0 {
            world.update_transition(id, transition.phase, new_progress)?;
            return Ok(None);
        }

        match transition.phase {
            TransitionPhase::FadeOut => {
                // Teleport is atomic: moved here, then immediately enter fadeIn.
                world.set_character_map(
                    id,
                    transition.to_map_id.clone(),
                    transition.to_node_id.clone(),
                    transition.to_position,
                )?;
                world.update_transition(id, TransitionPhase::Teleport, 0.0)?;
                world.update_transition(id, TransitionPhase::FadeIn, 0.0)?;
                Ok(None)
            }
            TransitionPhase::Teleport => {
                world.update_transition(id, TransitionPhase::FadeIn, 0.0)?;
                Ok(None)
            }
            TransitionPhase::FadeIn => {
                world.end_transition(id)?;
                self.after_transition(world, id)
            }
        }
    }

    fn after_transition(&self, world: &mut WorldState, id: &CharacterId) -> MobilityResult<Option<MobilityEvent>> {
        let cross_active = world.get_character(id)?.cross_map_navigation.is_active;
        if !cross_active {
            return Ok(Some(MobilityEvent::NavigationComplete(id.clone())));
        }

        let has_more = world.get_character(id)?.cross_map_navigation.has_more_segments();
        if has_more {
            world.advance_cross_map_nav(id)?;
            let segment = world.get_character(id)?.cross_map_navigation.current_segment().cloned().expect("has_more checked");
            self.begin_segment(world, id, &segment)?;
            Ok(None)
        } else {
            world.complete_cross_map_nav(id)?;
            Ok(Some(MobilityEvent::NavigationComplete(id.clone())))
        }
    }
}

/// Build the [`NavigationState`] for walking `path[index - 1] → path[index]`,
/// with `current_path_index = index` meaning "the node we are travelling
/// towards right now".
fn nav_state_for_path(
    map: &Map,
    path: Vec<NodeId>,
    index: usize,
    start_position: Position,
) -> MobilityResult<NavigationState> {
    let len = path.len();
    let target_id = path
        .get(index)
        .ok_or_else(|| MobilityError::NoPath { map: map.id.clone(), index, len })?;
    let target_position = map
        .nodes
        .get(target_id)
        .ok_or_else(|| MobilityError::NodeNotFound(target_id.clone(), map.id.clone()))?
        .position();

    Ok(NavigationState {
        is_moving: true,
        path,
        current_path_index: index,
        progress: 0.0,
        start_position,
        target_position,
    })
}

fn lerp_position(a: Position, b: Position, t: f32) -> Position {
    Position::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

/// Direction derives from the component of largest absolute delta
/// (spec.md §9 "Rounding & determinism").
fn direction_between(a: Position, b: Position) -> Direction {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    if dx.abs() >= dy.abs() {
        if dx >= 0.0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if dy >= 0.0 {
        Direction::Down
    } else {
        Direction::Up
    }
}
