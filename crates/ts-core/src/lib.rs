//! `ts-core` — foundational types for the town-life simulation substrate.
//!
//! This crate is a dependency of every other `ts-*` crate. It intentionally
//! has no `ts-*` dependencies and minimal external ones (`thiserror`, `chrono`
//! plus `chrono-tz`, and optional `serde`/`toml`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                  |
//! |------------|-------------------------------------------------------------|
//! | [`ids`]    | `CharacterId`, `NpcId`, `MapId`, `NodeId`, `FacilityId`, `ActionId`, `JobId`, `SessionId`, `MemoryId` |
//! | [`stats`]  | `Stats` (the five status bars), `StatusType`, interrupt threshold |
//! | [`time`]   | `WorldTime`, `WorldClock`, timezone/day-rollover helpers  |
//! | [`config`] | `WorldConfig` and the data it bundles (grid, timing, decay rates, action table) |
//! | [`error`]  | `CoreError`, `CoreResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                      |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types and enables `WorldConfig::from_toml_str`. |

pub mod config;
pub mod error;
pub mod ids;
pub mod stats;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{ActionConfig, DecayRates, GridDefaults, StatDelta, TimingConfig, WorldConfig};
pub use error::{CoreError, CoreResult};
pub use ids::{ActionId, CharacterId, FacilityId, JobId, MapId, MemoryId, NodeId, NpcId, SessionId};
pub use stats::{Stats, StatusType, STATUS_INTERRUPT_THRESHOLD};
pub use time::{day_rolled_over, parse_timezone, WorldClock, WorldTime};
