//! `ConversationManager` — the session registry, keyed by `characterId`
//! (spec.md §4.8: "only one active session per character").

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use ts_core::{CharacterId, NpcId, SessionId};
use ts_world::{ConversationRef, WorldState};

use crate::error::{ConversationError, ConversationResult};
use crate::session::{ConversationSession, Goal, Message, SessionStatus, MAX_TURNS};

/// Emoji shown over a character's head while a conversation is in progress
/// (spec.md §4.8 `startConversation`).
const TALKING_EMOJI: &str = "💬";

pub struct ConversationManager {
    sessions: HashMap<CharacterId, ConversationSession>,
    next_id: u64,
}

impl ConversationManager {
    pub fn new() -> Self {
        Self { sessions: HashMap::new(), next_id: 0 }
    }

    fn mint_session_id(&mut self) -> SessionId {
        self.next_id += 1;
        SessionId::new(format!("session-{}", self.next_id))
    }

    /// spec.md §4.8 `startConversation`: validates the character has no
    /// active session and the NPC exists and isn't already busy, then marks
    /// both sides and creates the session.
    pub fn start_conversation(
        &mut self,
        world: &mut WorldState,
        character_id: &CharacterId,
        npc_id: &NpcId,
        goal: Goal,
        now: DateTime<Utc>,
    ) -> ConversationResult<&ConversationSession> {
        let character = world.get_character(character_id)?;
        if character.conversation.is_some() {
            return Err(ConversationError::AlreadyInConversation(character_id.clone()));
        }
        let npc = world.get_npc(npc_id)?;
        if npc.is_in_conversation {
            return Err(ConversationError::NpcBusy(npc_id.clone()));
        }

        let id = self.mint_session_id();
        let session = ConversationSession {
            id: id.clone(),
            character_id: character_id.clone(),
            npc_id: npc_id.clone(),
            goal,
            messages: Vec::new(),
            max_turns: MAX_TURNS,
            start_time: now,
            status: SessionStatus::Active,
            goal_achieved: false,
        };

        world.set_npc_conversation_flag(npc_id, true)?;
        world.set_character_conversation(
            character_id,
            Some(ConversationRef { session_id: id, npc_id: npc_id.clone() }),
        )?;
        world.set_display_emoji(character_id, Some(TALKING_EMOJI.to_string()))?;

        self.sessions.insert(character_id.clone(), session);
        Ok(self.sessions.get(character_id).expect("just inserted"))
    }

    /// Append `message`, recomputing `currentTurn` implicitly (spec.md §8
    /// property 3 is a derived read, not stored state — see
    /// [`ConversationSession::current_turn`]).
    pub fn add_message(
        &mut self,
        character_id: &CharacterId,
        message: Message,
    ) -> ConversationResult<&ConversationSession> {
        let session = self
            .sessions
            .get_mut(character_id)
            .ok_or_else(|| ConversationError::NoActiveSession(character_id.clone()))?;
        session.messages.push(message);
        Ok(session)
    }

    pub fn get_active_session(&self, character_id: &CharacterId) -> Option<&ConversationSession> {
        self.sessions.get(character_id).filter(|s| s.status == SessionStatus::Active)
    }

    /// spec.md §4.8 `endConversation`: closes the session, clears the NPC's
    /// busy flag and the character's conversation pointer/emoji, and hands
    /// back the closed snapshot (for post-processing, which must see the
    /// full message list — spec.md §4.8 step 6).
    pub fn end_conversation(
        &mut self,
        world: &mut WorldState,
        character_id: &CharacterId,
        goal_achieved: bool,
    ) -> ConversationResult<ConversationSession> {
        let mut session = self
            .sessions
            .remove(character_id)
            .ok_or_else(|| ConversationError::NoActiveSession(character_id.clone()))?;
        session.status = SessionStatus::Completed;
        session.goal_achieved = goal_achieved;

        world.set_npc_conversation_flag(&session.npc_id, false)?;
        world.set_character_conversation(character_id, None)?;
        world.set_display_emoji(character_id, None)?;

        Ok(session)
    }
}

impl Default for ConversationManager {
    fn default() -> Self {
        Self::new()
    }
}
