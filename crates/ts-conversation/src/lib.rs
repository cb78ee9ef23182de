//! `ts-conversation` — the session registry, the alternating-turn async
//! executor, and post-conversation extraction (spec.md §4.8, component C8).
//!
//! # Crate layout
//!
//! | Module         | Contents                                              |
//! |----------------|--------------------------------------------------------|
//! | [`session`]    | `ConversationSession`, `Message`, `Goal`, `Speaker`    |
//! | [`manager`]    | `ConversationManager` — the per-character session map  |
//! | [`executor`]   | `ConversationExecutor` — background turn loop          |
//! | [`postprocess`]| `ConversationPostProcessor`, `apply_extraction`        |
//! | [`memory`]     | `MidTermMemory`, `Importance`                          |
//! | [`store`]      | `ConversationStore` trait, `NullConversationStore`     |
//! | [`error`]      | `ConversationError`, `ConversationResult<T>`           |
//!
//! The turn loop and the post-processing LLM call both run entirely inside
//! one spawned task, touching no [`ts_world::WorldState`] — only the
//! engine's tick loop applies a completed [`executor::ConversationOutcome`]
//! back onto the world (spec.md §5: background tasks never mutate state).

pub mod error;
pub mod executor;
pub mod manager;
pub mod memory;
pub mod postprocess;
pub mod session;
pub mod store;

#[cfg(test)]
mod tests;

pub use error::{ConversationError, ConversationResult};
pub use executor::{ConversationEvent, ConversationExecutor, ConversationOutcome};
pub use manager::ConversationManager;
pub use memory::{Importance, MidTermMemory};
pub use postprocess::{apply_extraction, ConversationExtraction, ConversationPostProcessor, ExtractedMemory};
pub use session::{ConversationSession, Goal, Message, Speaker, MAX_TURNS};
pub use store::{ConversationStore, ConversationSummaryEntry, NpcDynamicState, NullConversationStore};
