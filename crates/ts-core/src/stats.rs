//! Character status bars and the status-interrupt vocabulary shared by
//! `ts-time` (which decays them) and `ts-world` (which stores them on
//! `Character`).
//!
//! Kept in `ts-core` rather than `ts-world` so `ts-time`'s decay pipeline can
//! operate on `Stats` without depending on the character/NPC record types.

use std::fmt;

/// The five status bars every character carries. All are `0..=100` with
/// `100` meaning "fully satisfied"; money is tracked separately on
/// `Character` and has no upper bound.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stats {
    pub satiety: f32,
    pub bladder: f32,
    pub energy: f32,
    pub hygiene: f32,
    pub mood: f32,
}

impl Default for Stats {
    /// All bars start full.
    fn default() -> Self {
        Self { satiety: 100.0, bladder: 100.0, energy: 100.0, hygiene: 100.0, mood: 100.0 }
    }
}

/// The threshold below which a stat is considered "low" for status-interrupt
/// purposes (spec.md §4.5).
pub const STATUS_INTERRUPT_THRESHOLD: f32 = 10.0;

impl Stats {
    /// Clamp every field into `[0, 100]`.
    pub fn clamp_all(&mut self) {
        self.satiety = self.satiety.clamp(0.0, 100.0);
        self.bladder = self.bladder.clamp(0.0, 100.0);
        self.energy = self.energy.clamp(0.0, 100.0);
        self.hygiene = self.hygiene.clamp(0.0, 100.0);
        self.mood = self.mood.clamp(0.0, 100.0);
    }

    /// Round every field to two decimal places, the precision the durable
    /// store persists (spec.md §4.9: "all writes round status stats to two
    /// decimals to avoid float drift").
    pub fn round_for_persistence(&mut self) {
        self.satiety = round2(self.satiety);
        self.bladder = round2(self.bladder);
        self.energy = round2(self.energy);
        self.hygiene = round2(self.hygiene);
        self.mood = round2(self.mood);
    }

    /// Read a single stat by its [`StatusType`].
    pub fn get(&self, stat: StatusType) -> f32 {
        match stat {
            StatusType::Bladder => self.bladder,
            StatusType::Satiety => self.satiety,
            StatusType::Energy => self.energy,
            StatusType::Hygiene => self.hygiene,
            StatusType::Mood => self.mood,
        }
    }

    fn set(&mut self, stat: StatusType, value: f32) {
        match stat {
            StatusType::Bladder => self.bladder = value,
            StatusType::Satiety => self.satiety = value,
            StatusType::Energy => self.energy = value,
            StatusType::Hygiene => self.hygiene = value,
            StatusType::Mood => self.mood = value,
        }
    }

    pub(crate) fn set_clamped(&mut self, stat: StatusType, value: f32) {
        self.set(stat, value.clamp(0.0, 100.0));
    }
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// One of the five decaying status bars, in the priority order used to
/// resolve simultaneous threshold crossings (spec.md §4.5: "Priority when
/// multiple stats trip simultaneously: bladder > satiety > energy >
/// hygiene"). `Mood` has no forced action and is ordered last.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusType {
    Bladder,
    Satiety,
    Energy,
    Hygiene,
    Mood,
}

impl StatusType {
    /// All five, in priority order (highest first).
    pub const ALL_BY_PRIORITY: [StatusType; 5] = [
        StatusType::Bladder,
        StatusType::Satiety,
        StatusType::Energy,
        StatusType::Hygiene,
        StatusType::Mood,
    ];

    /// The action sentinel this status forces a character into on interrupt,
    /// per the table `{bladder→toilet, satiety→eat, energy→sleep,
    /// hygiene→bathe}` (spec.md §4.5). `Mood` has none.
    pub fn forced_action(self) -> Option<&'static str> {
        match self {
            StatusType::Bladder => Some("toilet"),
            StatusType::Satiety => Some("eat"),
            StatusType::Energy => Some("sleep"),
            StatusType::Hygiene => Some("bathe"),
            StatusType::Mood => None,
        }
    }
}

impl fmt::Display for StatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatusType::Bladder => "bladder",
            StatusType::Satiety => "satiety",
            StatusType::Energy => "energy",
            StatusType::Hygiene => "hygiene",
            StatusType::Mood => "mood",
        };
        f.write_str(s)
    }
}
