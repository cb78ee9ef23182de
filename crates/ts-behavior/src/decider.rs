//! `BehaviorDecider` — the LLM-backed decision with a deterministic rules
//! fallback (spec.md §4.7).

use std::sync::Arc;

use ts_core::{ActionId, StatusType, STATUS_INTERRUPT_THRESHOLD};
use ts_schedule::ScheduleManager;

use crate::context::DecisionContext;
use crate::intent::Intent;
use crate::llm::{GenerateObjectRequest, LLMClient, SchemaKind};

/// Produces an [`Intent`] for a character eligible for a new decision.
///
/// Holds an optional LLM client; with none configured (or when
/// `LLMClient::is_available` says no, or the call errors/times out) every
/// decision runs the rules fallback described in spec.md §4.7.
pub struct BehaviorDecider {
    llm: Option<Arc<dyn LLMClient>>,
}

impl BehaviorDecider {
    pub fn new(llm: Option<Arc<dyn LLMClient>>) -> Self {
        Self { llm }
    }

    /// spec.md §4.7. `forced` is `Some(stat)` in interrupt mode — a status
    /// bar crossed below threshold and the schedule is ignored in favor of
    /// the mapped action (the caller, `ts-engine`, detects the crossing via
    /// `ts-time::pick_interrupt` and sets this).
    pub async fn decide(&self, ctx: &DecisionContext<'_>, forced: Option<StatusType>) -> Intent {
        if let Some(stat) = forced {
            return forced_intent(stat);
        }

        if let Some(client) = &self.llm {
            if client.is_available() {
                match ask_llm(client.as_ref(), ctx).await {
                    Ok(intent) => return intent,
                    Err(err) => {
                        tracing::warn!(
                            character = %ctx.character.id,
                            error = %err,
                            "behavior LLM call failed, falling back to rules"
                        );
                    }
                }
            }
        }

        rules_fallback(ctx)
    }
}

async fn ask_llm(client: &dyn LLMClient, ctx: &DecisionContext<'_>) -> crate::error::BehaviorResult<Intent> {
    let request = GenerateObjectRequest {
        prompt: build_prompt(ctx),
        schema: SchemaKind::BehaviorIntent,
        system: None,
    };
    let value = client.generate_object(request).await?;
    serde_json::from_value(value).map_err(|e| crate::error::BehaviorError::SchemaMismatch("behavior-intent", e.to_string()))
}

fn build_prompt(ctx: &DecisionContext<'_>) -> String {
    format!(
        "character {} at {}, stats satiety={:.1} bladder={:.1} energy={:.1} hygiene={:.1} mood={:.1}, {} nearby npcs, {} reachable maps",
        ctx.character.id,
        ctx.current_time,
        ctx.character.stats.satiety,
        ctx.character.stats.bladder,
        ctx.character.stats.energy,
        ctx.character.stats.hygiene,
        ctx.character.stats.mood,
        ctx.nearby_npcs.len(),
        ctx.reachable_maps.len(),
    )
}

/// "Pick the lowest stat < threshold and emit the mapped forced action, or
/// advance to the next unfinished schedule entry's canonical location."
fn rules_fallback(ctx: &DecisionContext<'_>) -> Intent {
    if let Some(stat) = lowest_stat_below_threshold(&ctx.character.stats) {
        return forced_intent(stat);
    }

    let completed: Vec<ActionId> = ctx.recent_history.iter().map(|h| h.action_id.clone()).collect();
    let now_minutes = ctx.current_time.minutes_of_day();
    match ScheduleManager::next_unfinished(ctx.schedule_today, &completed, now_minutes) {
        Some(entry) => Intent::StartAction {
            action_id: entry.activity.clone(),
            duration_minutes: None,
            facility_id: entry.facility_id.clone(),
            reason: entry.reason.clone().unwrap_or_else(|| "scheduled activity".to_string()),
        },
        None => Intent::Idle { reason: "no schedule entries remaining today".to_string() },
    }
}

fn lowest_stat_below_threshold(stats: &ts_core::Stats) -> Option<StatusType> {
    StatusType::ALL_BY_PRIORITY
        .into_iter()
        .find(|stat| stats.get(*stat) < STATUS_INTERRUPT_THRESHOLD && stat.forced_action().is_some())
}

/// Interrupt mode: ignore the schedule, emit the status's mapped action.
/// Co-location with a facility offering the action is an admission concern
/// `ts-actions::ActionExecutor` enforces when the engine tries to start it;
/// on a `NoAccessibleFacility` rejection the engine re-dispatches a
/// `MoveToNode`/`MoveToMap` intent toward one before retrying.
fn forced_intent(stat: StatusType) -> Intent {
    match stat.forced_action() {
        Some(action_id) => Intent::StartAction {
            action_id: ActionId::new(action_id),
            duration_minutes: None,
            facility_id: None,
            reason: format!("status interrupt: {stat} below threshold"),
        },
        None => Intent::Idle { reason: format!("{stat} low, no mapped forced action") },
    }
}
