//! `ActionExecutor` — admission control and the timed action lifecycle
//! (spec.md §4.4, component C4).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use ts_core::{ActionId, CharacterId, FacilityId, GridDefaults, MapId, NodeId, NpcId, StatDelta, Stats};
use ts_spatial::{Facility, Map};
use ts_world::{ActionState, WorldState};

use crate::admission::AdmissionFailure;
use crate::definition::ActionDef;
use crate::error::{ActionError, ActionResult};
use crate::events::ActionEvent;

/// Extra per-call arguments `startAction` accepts beyond `(charId, actionId)`
/// (spec.md §4.4).
#[derive(Clone, Debug, Default)]
pub struct StartActionArgs {
    pub facility_id: Option<FacilityId>,
    pub target_npc_id: Option<NpcId>,
    pub duration_minutes: Option<u32>,
    pub reason: Option<String>,
    pub ignore_current_action: bool,
}

/// Admission control plus the start/tick/complete/force-complete lifecycle
/// for all actions in the world.
pub struct ActionExecutor {
    defs: HashMap<ActionId, ActionDef>,
    maps: HashMap<MapId, Map>,
    facilities: HashMap<FacilityId, Facility>,
    /// Per-map `node → facility ids` membership (SPEC_FULL.md §4.2a), built
    /// once at construction from each map's obstacles.
    facility_index: HashMap<MapId, HashMap<NodeId, Vec<FacilityId>>>,
    grid: GridDefaults,
}

impl ActionExecutor {
    pub fn new(defs: HashMap<ActionId, ActionDef>, maps: &HashMap<MapId, Map>, grid: GridDefaults) -> Self {
        let mut facilities = HashMap::new();
        let mut facility_index = HashMap::new();
        for (map_id, map) in maps {
            for facility in map.facilities() {
                facilities.insert(facility.id.clone(), facility.clone());
            }
            facility_index.insert(map_id.clone(), map.facility_membership_index(&grid));
        }
        Self { defs, maps: maps.clone(), facilities, facility_index, grid }
    }

    pub fn def(&self, action_id: &ActionId) -> Option<&ActionDef> {
        self.defs.get(action_id)
    }

    /// spec.md §4.4 `canExecuteAction`.
    pub fn can_execute_action(
        &self,
        world: &WorldState,
        character_id: &CharacterId,
        action_id: &ActionId,
        ignore_current_action: bool,
    ) -> ActionResult<Result<(), AdmissionFailure>> {
        let character = world.get_character(character_id)?;

        let Some(def) = self.defs.get(action_id) else {
            return Ok(Err(AdmissionFailure::UnknownAction(action_id.clone())));
        };

        if !ignore_current_action && character.current_action.is_some() {
            return Ok(Err(AdmissionFailure::AlreadyHasAction));
        }

        if !def.required_facility_tags.is_empty() {
            let accessible = self
                .facilities_at(&character.current_map_id, &character.current_node_id)
                .any(|f| {
                    f.tags.iter().any(|t| def.required_facility_tags.contains(t))
                        && self.is_accessible(f, character_id, character.money)
                });
            if !accessible {
                return Ok(Err(AdmissionFailure::NoAccessibleFacility {
                    required_tags: def.required_facility_tags.clone(),
                }));
            }
        }

        if def.requires_employment {
            let Some(employment) = &character.employment else {
                return Ok(Err(AdmissionFailure::NotEmployedHere { facility_id: None }));
            };
            let facility = self
                .facilities_at(&character.current_map_id, &character.current_node_id)
                .find(|f| f.job.as_ref().is_some_and(|j| j.job_id == employment.job_id));
            match facility {
                None => return Ok(Err(AdmissionFailure::NotEmployedHere { facility_id: None })),
                Some(f) => {
                    let job = f.job.as_ref().expect("matched above");
                    if !world.time().hour_in_range(job.work_hours.start, job.work_hours.end) {
                        return Ok(Err(AdmissionFailure::OutsideWorkHours {
                            start: job.work_hours.start,
                            end: job.work_hours.end,
                        }));
                    }
                }
            }
        }

        if def.requires_near_npc {
            let near = world.npcs_on_map(&character.current_map_id).any(|npc| {
                self.cardinally_adjacent(&character.current_map_id, &character.current_node_id, &npc.node_id)
            });
            if !near {
                return Ok(Err(AdmissionFailure::NoNpcNearby));
            }
        }

        Ok(Ok(()))
    }

    /// spec.md §4.4 `startAction`.
    pub fn start_action(
        &self,
        world: &mut WorldState,
        character_id: &CharacterId,
        action_id: &ActionId,
        args: StartActionArgs,
        now: DateTime<Utc>,
    ) -> ActionResult<Result<Option<ActionEvent>, AdmissionFailure>> {
        if let Err(reason) = self.can_execute_action(world, character_id, action_id, args.ignore_current_action)? {
            return Ok(Err(reason));
        }
        let def = self.defs.get(action_id).expect("checked present by can_execute_action");

        if let Some(facility_id) = &args.facility_id {
            if let Some(facility) = self.facilities.get(facility_id) {
                if let Some(cost) = facility.cost {
                    let character = world.get_character_mut(character_id)?;
                    character.money -= cost;
                }
            }
        }

        let duration_minutes = def.config.resolve_duration_minutes(args.duration_minutes);
        let target_end_time = now + chrono::Duration::milliseconds(duration_minutes as i64 * 60_000);

        let action = ActionState {
            action_id: action_id.clone(),
            start_time: now,
            target_end_time,
            facility_id: args.facility_id.clone(),
            target_npc_id: args.target_npc_id.clone(),
            duration_minutes: Some(duration_minutes),
            reason: args.reason.clone(),
        };
        world.set_current_action(character_id, Some(action))?;
        world.set_display_emoji(character_id, def.emoji.clone())?;

        let event = if ActionDef::is_thinking(action_id.as_str()) {
            None
        } else {
            Some(ActionEvent::Started { character_id: character_id.clone(), action_id: action_id.clone() })
        };
        Ok(Ok(event))
    }

    /// spec.md §4.4 "Tick": advance every character whose `currentAction`'s
    /// deadline has passed. `thinking`/`talk` are skipped — they're closed
    /// explicitly by their owning layer.
    pub fn tick(&self, world: &mut WorldState, now: DateTime<Utc>) -> ActionResult<Vec<ActionEvent>> {
        let due: Vec<CharacterId> = world
            .characters()
            .filter_map(|c| {
                let action = c.current_action.as_ref()?;
                if ActionDef::never_auto_completes(action.action_id.as_str()) {
                    return None;
                }
                if now >= action.target_end_time {
                    Some(c.id.clone())
                } else {
                    None
                }
            })
            .collect();

        let mut events = Vec::new();
        for character_id in due {
            events.extend(self.complete_action(world, &character_id)?);
        }
        Ok(events)
    }

    /// spec.md §4.4 "Complete".
    pub fn complete_action(&self, world: &mut WorldState, character_id: &CharacterId) -> ActionResult<Vec<ActionEvent>> {
        let character = world.get_character(character_id)?;
        let Some(action) = character.current_action.clone() else {
            return Err(ActionError::NoCurrentAction(character_id.clone()));
        };
        let Some(def) = self.defs.get(&action.action_id) else {
            return Err(ActionError::UnknownAction(action.action_id.clone()));
        };

        // Fixed actions apply their effects once here; variable-duration
        // actions never apply anything on completion — their `perMinute`
        // effects already accrued continuously via the decay pipeline.
        if let ts_core::ActionConfig::Fixed { effects, .. } = &def.config {
            let mut stats = character.stats;
            apply_fixed_effects(&mut stats, effects);
            stats.clamp_all();
            world.get_character_mut(character_id)?.stats = stats;

            if matches!(effects.get("money"), Some(StatDelta::HourlyWage)) {
                self.pay_wage(world, character_id, &action)?;
            }
        }

        world.set_current_action(character_id, None)?;
        world.set_display_emoji(character_id, None)?;

        Ok(vec![
            ActionEvent::RecordHistory {
                character_id: character_id.clone(),
                action_id: action.action_id.clone(),
                facility_id: action.facility_id.clone(),
                target_npc_id: action.target_npc_id.clone(),
                duration_minutes: action.duration_minutes,
                reason: action.reason.clone(),
            },
            ActionEvent::Completed { character_id: character_id.clone(), action_id: action.action_id.clone() },
        ])
    }

    /// spec.md §4.4 "Force-complete": clears state, no effects, no callbacks.
    pub fn force_complete(&self, world: &mut WorldState, character_id: &CharacterId) -> ActionResult<()> {
        world.set_current_action(character_id, None)?;
        world.set_display_emoji(character_id, None)?;
        Ok(())
    }

    /// spec.md §4.4 `getActivePerMinuteEffects` — the sole bridge into the
    /// decay pipeline for variable-duration actions.
    pub fn get_active_per_minute_effects(
        &self,
        world: &WorldState,
        character_id: &CharacterId,
    ) -> ActionResult<Option<HashMap<String, f32>>> {
        let character = world.get_character(character_id)?;
        let Some(action) = &character.current_action else { return Ok(None) };
        let Some(def) = self.defs.get(&action.action_id) else { return Ok(None) };
        match &def.config {
            ts_core::ActionConfig::Variable { per_minute, .. } => Ok(Some(per_minute.clone())),
            ts_core::ActionConfig::Fixed { .. } => Ok(None),
        }
    }

    fn facilities_at<'a>(&'a self, map_id: &'a MapId, node_id: &'a NodeId) -> impl Iterator<Item = &'a Facility> + 'a {
        self.facility_index
            .get(map_id)
            .and_then(|idx| idx.get(node_id))
            .into_iter()
            .flatten()
            .filter_map(move |fid| self.facilities.get(fid))
    }

    fn is_accessible(&self, facility: &Facility, character_id: &CharacterId, money: i64) -> bool {
        let owner_ok = facility.owner.as_ref().map_or(true, |o| o == character_id);
        let cost_ok = facility.cost.map_or(true, |c| money >= c);
        owner_ok && cost_ok
    }

    /// Cardinal (non-diagonal) adjacency between two nodes' tile
    /// coordinates on the same map — distinguishes `nearNpc` from the
    /// 8-connected pathing graph (spec.md §4.4 check 5).
    fn cardinally_adjacent(&self, map_id: &MapId, a: &NodeId, b: &NodeId) -> bool {
        let Some(map) = self.maps.get(map_id) else { return false };
        let (Some(na), Some(nb)) = (map.nodes.get(a), map.nodes.get(b)) else { return false };
        let ax = (na.x / self.grid.cell_width).round() as i32;
        let ay = (na.y / self.grid.cell_height).round() as i32;
        let bx = (nb.x / self.grid.cell_width).round() as i32;
        let by = (nb.y / self.grid.cell_height).round() as i32;
        (ax - bx).abs() + (ay - by).abs() == 1
    }

    fn pay_wage(&self, world: &mut WorldState, character_id: &CharacterId, action: &ActionState) -> ActionResult<()> {
        let Some(facility_id) = &action.facility_id else { return Ok(()) };
        let Some(facility) = self.facilities.get(facility_id) else { return Ok(()) };
        let Some(job) = &facility.job else { return Ok(()) };
        let Some(duration_minutes) = action.duration_minutes else { return Ok(()) };
        let hours_worked = duration_minutes as f32 / 60.0;
        let wage = (job.hourly_wage * hours_worked).floor() as i64;
        world.get_character_mut(character_id)?.money += wage;
        Ok(())
    }
}

fn apply_fixed_effects(stats: &mut Stats, effects: &HashMap<String, StatDelta>) {
    for (key, delta) in effects {
        let StatDelta::Amount(amount) = delta else { continue };
        match key.as_str() {
            "satiety" => stats.satiety += amount,
            "bladder" => stats.bladder += amount,
            "energy" => stats.energy += amount,
            "hygiene" => stats.hygiene += amount,
            "mood" => stats.mood += amount,
            _ => {}
        }
    }
}
