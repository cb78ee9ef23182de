//! `ts-persistence` — the durable-store capability list (spec.md §4.9,
//! component C9) and its two implementations.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                  |
//! |-------------|--------------------------------------------------------------|
//! | [`store`]   | `StateStore` trait — snapshots, characters, time/map globals |
//! | [`record`]  | `CharacterRecord` — the persisted slice of `ts_world::Character` |
//! | [`snapshot`]| `StateSnapshot` — the `saveState(full)`/`loadState()` payload |
//! | [`memory`]  | `InMemoryStore` — deep-copy-on-call, for tests/dev            |
//! | [`sqlite`]  | `SqliteStore` — embedded SQL, behind the `sqlite` feature      |
//! | [`error`]   | `PersistenceError`, `PersistenceResult<T>`                     |
//!
//! `ScheduleStore` (`ts-schedule`) and `ConversationStore` (`ts-conversation`)
//! are implemented by the same concrete stores as additional facets — see
//! each module's doc comment.
//!
//! # Feature flags
//!
//! | Flag     | Effect                                                       |
//! |----------|----------------------------------------------------------------|
//! | `sqlite` | Adds [`sqlite::SqliteStore`], an embedded-SQL `StateStore`.     |

pub mod error;
pub mod memory;
pub mod record;
pub mod snapshot;
pub mod store;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use error::{PersistenceError, PersistenceResult};
pub use memory::InMemoryStore;
pub use record::CharacterRecord;
pub use snapshot::StateSnapshot;
pub use store::StateStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
