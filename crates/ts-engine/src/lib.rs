//! `ts-engine` — boot and tick-loop wiring for every other `ts-*` crate
//! (spec.md §4.10, component C10).
//!
//! # Crate layout
//!
//! | Module        | Contents                                                     |
//! |---------------|-------------------------------------------------------------|
//! | [`bundle`]    | Boot-time seed types, `build_action_table`                   |
//! | [`bootstrap`] | `EngineBuilder` — fresh-vs-restore boot                      |
//! | [`engine`]    | `Engine` — the tick loop                                      |
//! | [`callbacks`] | `EngineObserver`, `NoopObserver`                              |
//! | [`snapshot`]  | `ObservableSnapshot` — the external broadcast view            |
//! | [`error`]     | `EngineError`, `EngineResult<T>`                               |
//!
//! # Feature flags
//!
//! | Flag     | Effect                                                          |
//! |----------|-------------------------------------------------------------------|
//! | `sqlite` | Forwarded to `ts-persistence/sqlite`, enabling `SqliteStore` use. |

pub mod bootstrap;
pub mod bundle;
pub mod callbacks;
pub mod engine;
pub mod error;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use bootstrap::EngineBuilder;
pub use bundle::{build_action_table, ActionAdmissionEntry, CharacterBundleEntry, NpcBundleEntry};
pub use callbacks::{EngineObserver, NoopObserver};
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use snapshot::{ObservableCharacter, ObservableNpc, ObservableSnapshot, TransitionView};
