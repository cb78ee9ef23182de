//! `ts-world` — the authoritative in-memory world-state store (spec.md §4.1,
//! component C1). Every other simulation crate mutates characters and NPCs
//! exclusively through [`WorldState`]'s methods.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                   |
//! |-------------|-------------------------------------------------------------|
//! | [`character`] | `Character` and its runtime sub-states (navigation, transition, action, conversation ref) |
//! | [`npc`]       | `Npc`, `NpcMood`                                           |
//! | [`world`]     | `WorldState` — the store and its mutation API              |
//! | [`snapshot`]  | `WorldSnapshot` — the deep-copied, broadcast-safe view      |
//! | [`error`]     | `WorldError`, `WorldResult<T>`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                      |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.           |

pub mod character;
pub mod error;
pub mod npc;
pub mod snapshot;
pub mod world;

#[cfg(test)]
mod tests;

pub use character::{
    ActionState, Character, ConversationRef, CrossMapNav, Employment, LlmProfile, NavigationState,
    PendingDecision, TransitionPhase, TransitionState,
};
pub use error::{WorldError, WorldResult};
pub use npc::{Npc, NpcMood};
pub use snapshot::WorldSnapshot;
pub use world::WorldState;
