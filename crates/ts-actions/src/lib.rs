//! `ts-actions` — admission control and the timed action lifecycle (spec.md
//! §4.4, component C4).
//!
//! # Crate layout
//!
//! | Module         | Contents                                              |
//! |----------------|--------------------------------------------------------|
//! | [`executor`]   | `ActionExecutor` — can-execute, start, tick, complete   |
//! | [`definition`] | `ActionDef`, the `thinking`/`talk` sentinels            |
//! | [`admission`]  | `AdmissionFailure` — the five structured rejection reasons |
//! | [`events`]     | `ActionEvent` — the engine-facing tick/complete output  |
//! | [`error`]      | `ActionError`, `ActionResult<T>`                        |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                      |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types (via deps). |

pub mod admission;
pub mod definition;
pub mod error;
pub mod events;
pub mod executor;

#[cfg(test)]
mod tests;

pub use admission::AdmissionFailure;
pub use definition::{ActionDef, TALK, THINKING};
pub use error::{ActionError, ActionResult};
pub use events::ActionEvent;
pub use executor::{ActionExecutor, StartActionArgs};
