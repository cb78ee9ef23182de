//! Events `CharacterSimulator::tick` reports back to its caller.
//!
//! Mirrors spec.md §9's "callbacks → message passing" design note: rather
//! than a mutable callback slot, `tick` returns a plain `Vec` the engine
//! drains at a fixed point (spec.md §4.10 step 5) to dispatch behavior
//! decisions.

use ts_core::CharacterId;

/// Something the engine should react to after a mobility tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MobilityEvent {
    /// A character finished moving (and any map transition) and is once
    /// again idle — spec.md §4.3's `onNavigationComplete(characterId)`.
    NavigationComplete(CharacterId),
}
