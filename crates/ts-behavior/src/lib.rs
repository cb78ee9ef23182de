//! `ts-behavior` — the `Intent` type, the `LLMClient` trait, and the
//! LLM-backed decider with its rules fallback (spec.md §4.7, component C7).
//!
//! # Crate layout
//!
//! | Module      | Contents                                                   |
//! |-------------|---------------------------------------------------------------|
//! | [`intent`]  | `Intent` — the five decision shapes                        |
//! | [`context`] | `DecisionContext` — the read-only bundle a decision reads   |
//! | [`llm`]     | `LLMClient` trait, `SchemaKind`, `GenerateObjectRequest`     |
//! | [`decider`] | `BehaviorDecider` — LLM call with rules fallback            |
//! | [`error`]   | `BehaviorError`, `BehaviorResult<T>`                        |

pub mod context;
pub mod decider;
pub mod error;
pub mod intent;
pub mod llm;


pub use context::{ConversationSummaryRef, DecisionContext, MemoryRef, NearbyNpc, ReachableMap};
pub use decider::BehaviorDecider;
pub use error::{BehaviorError, BehaviorResult};
pub use intent::Intent;
pub use llm::{GenerateObjectRequest, LLMClient, SchemaKind};
