//! World configuration: grid defaults, timing, movement speed, decay rates,
//! timezone, and the action table — the "world-config bundle" read at boot.
//!
//! Loaded once at boot from a TOML document, the way `Bjogert-TheGame` loads
//! its own config — `dt-core::SimConfig` is constructed in code by the
//! teacher's example binaries rather than parsed from a file, so the TOML
//! deserialization path here is an enrichment drawn from the wider
//! retrieval pack rather than a copy of the teacher.

use std::collections::HashMap;

use crate::ActionId;

/// Default grid cell size in pixels, used when a map doesn't override it.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridDefaults {
    pub cell_width: f32,
    pub cell_height: f32,
}

impl Default for GridDefaults {
    fn default() -> Self {
        Self { cell_width: 32.0, cell_height: 32.0 }
    }
}

/// Timing knobs: engine tick rate and conversation turn interval.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingConfig {
    /// Ticks per second for the engine's fixed-rate loop (reference: 20 Hz).
    pub tick_hz: f32,
    /// Milliseconds slept between conversation turns (default 60s, 0 for
    /// tests).
    pub turn_interval_ms: u64,
    /// Persist a full snapshot every N engine ticks.
    pub save_interval_ticks: u64,
    /// Deadline, in milliseconds, for a single `LLMClient::generate_object`
    /// call before it is treated as a timeout.
    pub llm_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_hz: 20.0,
            turn_interval_ms: 60_000,
            save_interval_ticks: 200,
            llm_timeout_ms: 15_000,
        }
    }
}

/// Per-minute stat decay rates.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecayRates {
    pub satiety_per_minute: f32,
    pub bladder_per_minute: f32,
    pub energy_per_minute: f32,
    pub hygiene_per_minute: f32,
    pub mood_per_minute: f32,
}

impl Default for DecayRates {
    fn default() -> Self {
        Self {
            satiety_per_minute: 0.05,
            bladder_per_minute: 0.08,
            energy_per_minute: 0.04,
            hygiene_per_minute: 0.03,
            mood_per_minute: 0.02,
        }
    }
}

/// One action's timing/effect shape.
///
/// A closed, small union — modeled as a tagged enum rather than an open
/// trait, since the set of shapes (fixed vs. variable duration) is fixed and
/// small.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind"))]
pub enum ActionConfig {
    /// A fixed-duration action (e.g. `toilet`) applying its effects once on
    /// completion.
    Fixed {
        duration_minutes: u32,
        #[cfg_attr(feature = "serde", serde(default))]
        effects: HashMap<String, StatDelta>,
    },
    /// A variable-duration action (e.g. `sleep`, `eat`) whose effects accrue
    /// continuously via the decay pipeline rather than once on completion.
    Variable {
        duration_min: u32,
        duration_max: u32,
        duration_default: u32,
        per_minute: HashMap<String, f32>,
    },
}

impl ActionConfig {
    /// Clamp a requested duration into `[min, max]`, falling back to
    /// `default` when no duration was requested.
    pub fn resolve_duration_minutes(&self, requested: Option<u32>) -> u32 {
        match self {
            ActionConfig::Fixed { duration_minutes, .. } => *duration_minutes,
            ActionConfig::Variable { duration_min, duration_max, duration_default, .. } => {
                match requested {
                    Some(d) => d.clamp(*duration_min, *duration_max),
                    None => *duration_default,
                }
            }
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, ActionConfig::Fixed { .. })
    }
}

/// Either a flat amount or the `"hourlyWage"` sentinel used by actions whose
/// completion pays a job wage proportional to hours worked.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum StatDelta {
    Amount(f32),
    HourlyWage,
}

/// The full world-config bundle read at boot.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldConfig {
    #[cfg_attr(feature = "serde", serde(default))]
    pub grid: GridDefaults,
    #[cfg_attr(feature = "serde", serde(default))]
    pub timing: TimingConfig,
    /// Movement speed in pixels per second.
    #[cfg_attr(feature = "serde", serde(default = "default_movement_speed"))]
    pub movement_speed: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub decay_rates: DecayRates,
    /// IANA timezone name, e.g. `"America/Los_Angeles"`.
    #[cfg_attr(feature = "serde", serde(default = "default_timezone"))]
    pub timezone: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub actions: HashMap<ActionId, ActionConfig>,
}

fn default_movement_speed() -> f32 {
    96.0
}

fn default_timezone() -> String {
    "UTC".to_string()
}

#[cfg(feature = "serde")]
impl WorldConfig {
    /// Parse a `WorldConfig` from a TOML document's contents.
    pub fn from_toml_str(s: &str) -> Result<Self, crate::CoreError> {
        toml::from_str(s).map_err(|e| crate::CoreError::Parse(e.to_string()))
    }
}
