//! `ts-time` — wall-clock-driven world time, stat decay, and status-interrupt
//! detection (spec.md §4.5, component C5).
//!
//! # Crate layout
//!
//! | Module    | Contents                                                    |
//! |-----------|--------------------------------------------------------------|
//! | [`clock`] | `TimeManager` — `WorldClock` plus last-decay-pass bookkeeping |
//! | [`decay`] | `decay_stats`, `pick_interrupt`                             |
//! | [`error`] | `TimeError`, `TimeResult<T>`                                |
//!
//! Decay and world-time derivation are pure functions over [`ts_core::Stats`]
//! / [`ts_core::WorldClock`] rather than methods on `ts-world`'s `Character`,
//! so this crate has no dependency on `ts-world` and can be unit tested in
//! isolation (the decay law in spec.md §8 is tested here).

pub mod clock;
pub mod decay;
pub mod error;


pub use clock::TimeManager;
pub use decay::{decay_stats, pick_interrupt};
pub use error::{TimeError, TimeResult};
