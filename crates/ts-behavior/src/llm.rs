//! `LLMClient` — the consumed capability spec.md §6 names:
//! `generateObject(prompt, schema, {system})` / `isAvailable()`. No concrete
//! transport crate is introduced (out of scope per spec.md §1); this crate
//! only names the trait and the schema identifiers it validates against.

use async_trait::async_trait;

use crate::error::BehaviorResult;

/// The five structured-output schemas named in spec.md §6. The spec never
/// prescribes the schema contents, only that responses are validated
/// against one of these before being handed back as JSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaKind {
    CharacterUtterance,
    NpcUtterance,
    BehaviorIntent,
    ConversationExtraction,
    ScheduleUpdate,
}

impl SchemaKind {
    pub fn name(self) -> &'static str {
        match self {
            SchemaKind::CharacterUtterance => "character-utterance",
            SchemaKind::NpcUtterance => "npc-utterance",
            SchemaKind::BehaviorIntent => "behavior-intent",
            SchemaKind::ConversationExtraction => "conversation-extraction",
            SchemaKind::ScheduleUpdate => "schedule-update",
        }
    }
}

/// One `generateObject` call.
#[derive(Clone, Debug)]
pub struct GenerateObjectRequest {
    pub prompt: String,
    pub schema: SchemaKind,
    pub system: Option<String>,
}

/// A structured-output LLM backend. Implementations live outside this
/// workspace (the demo binary wires a fake for local runs); `ts-behavior`
/// and `ts-conversation` only depend on this trait.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Issue a `generateObject` call; the returned JSON is expected to
    /// conform to `request.schema` (validation is the client's
    /// responsibility — this trait doesn't re-validate).
    async fn generate_object(&self, request: GenerateObjectRequest) -> BehaviorResult<serde_json::Value>;

    /// Cheap, synchronous availability check (e.g. "is an API key
    /// configured"), consulted before attempting a call so the rules
    /// fallback can run without paying a timeout.
    fn is_available(&self) -> bool;
}
