//! `ts-mobility` — per-tick movement interpolation and the map-transition
//! finite state machine (spec.md §4.3, component C3).
//!
//! # Crate layout
//!
//! | Module        | Contents                                               |
//! |---------------|---------------------------------------------------------|
//! | [`simulator`] | `CharacterSimulator` — movement, arrival, transition FSM |
//! | [`event`]     | `MobilityEvent` — the engine-facing tick output          |
//! | [`error`]     | `MobilityError`, `MobilityResult<T>`                     |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                      |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types (via deps). |

pub mod error;
pub mod event;
pub mod simulator;

#[cfg(test)]
mod tests;

pub use error::{MobilityError, MobilityResult};
pub use event::MobilityEvent;
pub use simulator::CharacterSimulator;
