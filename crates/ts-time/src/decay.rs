//! Real-time-driven stat decay (spec.md §4.5).
//!
//! `decay_stats` is the sole mutator of [`Stats`] in the whole workspace
//! outside of `ActionExecutor`'s fixed-effect application — everything else
//! (facility costs, wages) touches `Character::money`, not the status bars.

use ts_core::{DecayRates, Stats, StatusType};

/// Apply one decay pass of `elapsed_minutes` to `stats`, optionally blended
/// with an active variable-duration action's per-minute effects.
///
/// `newValue = clamp(old − decayRate·Δt + activePerMinute.stat·Δt, 0, 100)`
/// for every stat in `{satiety, bladder, energy, hygiene, mood}`
/// (spec.md §4.5). `active_per_minute` is `ActionExecutor::
/// get_active_per_minute_effects`'s return value for the character, keyed by
/// lowercase stat name; a stat absent from the map contributes `0`.
///
/// Returns the stats that just crossed from `≥10` to `<10` on this pass, in
/// priority order (bladder, satiety, energy, hygiene, mood) — the caller
/// picks at most the highest-priority entry to actually fire, per spec.md
/// §4.5's "fire once" / priority rule.
pub fn decay_stats(
    stats: &mut Stats,
    elapsed_minutes: f64,
    rates: &DecayRates,
    active_per_minute: Option<&std::collections::HashMap<String, f32>>,
) -> Vec<StatusType> {
    if elapsed_minutes <= 0.0 {
        return Vec::new();
    }

    let mut crossed = Vec::new();
    for stat in StatusType::ALL_BY_PRIORITY {
        let old = stats.get(stat);
        let rate = rate_for(rates, stat);
        let bonus = active_per_minute
            .and_then(|m| m.get(stat_key(stat)))
            .copied()
            .unwrap_or(0.0);
        let delta = (bonus - rate) as f64 * elapsed_minutes;
        let new = (old as f64 + delta) as f32;
        let new = new.clamp(0.0, 100.0);
        stats.set_clamped(stat, new);

        if old >= ts_core::STATUS_INTERRUPT_THRESHOLD && new < ts_core::STATUS_INTERRUPT_THRESHOLD {
            crossed.push(stat);
        }
    }
    crossed
}

fn rate_for(rates: &DecayRates, stat: StatusType) -> f32 {
    match stat {
        StatusType::Satiety => rates.satiety_per_minute,
        StatusType::Bladder => rates.bladder_per_minute,
        StatusType::Energy => rates.energy_per_minute,
        StatusType::Hygiene => rates.hygiene_per_minute,
        StatusType::Mood => rates.mood_per_minute,
    }
}

/// Lowercase key an `ActionConfig::Variable::per_minute` map uses for a stat.
fn stat_key(stat: StatusType) -> &'static str {
    match stat {
        StatusType::Satiety => "satiety",
        StatusType::Bladder => "bladder",
        StatusType::Energy => "energy",
        StatusType::Hygiene => "hygiene",
        StatusType::Mood => "mood",
    }
}

/// Of the stats that crossed the threshold on a single decay pass, pick the
/// one that should actually fire `onStatusInterrupt` — the highest-priority
/// entry (spec.md §4.5: "fire ... once" plus the bladder>satiety>energy>
/// hygiene priority rule, extended here to include mood last since the
/// source leaves simultaneous-crossing resolution to the implementer).
pub fn pick_interrupt(crossed: &[StatusType]) -> Option<StatusType> {
    StatusType::ALL_BY_PRIORITY.into_iter().find(|s| crossed.contains(s))
}
