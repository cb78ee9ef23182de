//! `StateStore` — the full durable-persistence capability list (spec.md
//! §4.9). Implemented by [`crate::memory::InMemoryStore`] (deep-copy, for
//! tests/dev) and, behind the `sqlite` feature, by
//! [`crate::sqlite::SqliteStore`] (embedded SQL).
//!
//! `ScheduleStore` (from `ts-schedule`) and `ConversationStore` (from
//! `ts-conversation`) are implemented separately by the same concrete
//! stores — this trait only covers the facets those two don't: snapshots,
//! characters, and the three single-row globals.

use chrono::{DateTime, Utc};
use ts_core::{CharacterId, MapId, WorldTime};

use crate::error::PersistenceResult;
use crate::record::CharacterRecord;
use crate::snapshot::StateSnapshot;

pub trait StateStore: Send + Sync {
    /// Full-world save: per spec.md §4.9, the durable implementation wraps
    /// this in one transaction — delete characters absent from the
    /// payload, upsert the rest, upsert time/currentMapId.
    fn save_state(&self, snapshot: &StateSnapshot) -> PersistenceResult<()>;
    fn load_state(&self) -> PersistenceResult<Option<StateSnapshot>>;

    fn save_character(&self, record: &CharacterRecord) -> PersistenceResult<()>;
    fn load_character(&self, id: &CharacterId) -> PersistenceResult<Option<CharacterRecord>>;
    fn load_all_characters(&self) -> PersistenceResult<Vec<CharacterRecord>>;
    fn delete_character(&self, id: &CharacterId) -> PersistenceResult<()>;

    fn save_time(&self, time: WorldTime) -> PersistenceResult<()>;
    fn load_time(&self) -> PersistenceResult<Option<WorldTime>>;

    fn save_current_map_id(&self, map_id: Option<&MapId>) -> PersistenceResult<()>;
    fn load_current_map_id(&self) -> PersistenceResult<Option<MapId>>;

    /// Stamped once at first boot (spec.md §4.10, §7); never overwritten by
    /// later saves unless `ts-engine::bootstrap` detects a legacy-data
    /// migration.
    fn save_server_start_time(&self, at: DateTime<Utc>) -> PersistenceResult<()>;
    fn load_server_start_time(&self) -> PersistenceResult<Option<DateTime<Utc>>>;
}
