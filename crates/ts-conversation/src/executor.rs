//! `ConversationExecutor` — runs a session's alternating turn loop as a
//! background task (spec.md §4.8, §5: "LLM calls never block the tick
//! loop"). Each turn calls out to the LLM and never touches `WorldState`;
//! the loop posts [`ConversationEvent`]s back through a bounded channel
//! that the engine's tick loop drains.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ts_behavior::{BehaviorError, GenerateObjectRequest, LLMClient, SchemaKind};
use ts_core::CharacterId;
use tokio::sync::mpsc;
use tracing::warn;

use crate::postprocess::{ConversationExtraction, ConversationPostProcessor};
use crate::session::{ConversationSession, Message, Speaker};

/// Fallback utterances substituted when a turn's LLM call fails (spec.md
/// §4.8 step 5). Unlike `ts_behavior::decider`'s rules fallback, there is no
/// deterministic equivalent for free-form dialogue to fall back to, so a
/// fixed line is substituted and the loop terminates immediately after
/// (spec.md §7: "conversation executor substitutes fallback utterances and
/// terminates the loop").
const CHARACTER_FALLBACK_UTTERANCE: &str = "えっと...";
const NPC_FALLBACK_UTTERANCE: &str = "そうですね...";

/// One turn, or the terminal outcome, of a running conversation.
#[derive(Clone, Debug)]
pub enum ConversationEvent {
    /// A single utterance was produced; `onMessageEmit` (spec.md §6).
    MessageEmitted { character_id: CharacterId, message: Message },
    /// The session ended — naturally (goal achieved), by exhausting
    /// `maxTurns`, or by erroring out of the loop entirely.
    Completed { character_id: CharacterId, outcome: ConversationOutcome },
}

#[derive(Clone, Debug)]
pub struct ConversationOutcome {
    pub messages: Vec<Message>,
    pub goal_achieved: bool,
    pub extraction: Option<ConversationExtraction>,
}

/// Spawns and tracks per-character conversation turn loops.
pub struct ConversationExecutor {
    llm: Arc<dyn LLMClient>,
    post_processor: Arc<ConversationPostProcessor>,
    turn_interval: Duration,
    active: Arc<Mutex<HashSet<CharacterId>>>,
    sender: mpsc::Sender<ConversationEvent>,
}

impl ConversationExecutor {
    pub fn new(
        llm: Arc<dyn LLMClient>,
        turn_interval: Duration,
        channel_capacity: usize,
    ) -> (Self, mpsc::Receiver<ConversationEvent>) {
        let (sender, receiver) = mpsc::channel(channel_capacity);
        let post_processor = Arc::new(ConversationPostProcessor::new(Arc::clone(&llm)));
        let executor = Self {
            llm,
            post_processor,
            turn_interval,
            active: Arc::new(Mutex::new(HashSet::new())),
            sender,
        };
        (executor, receiver)
    }

    /// Starts the turn loop for a freshly-opened session, unless one is
    /// already running for this character (spec.md §4.8: one session per
    /// character, so this should never happen, but `spawn` is idempotent
    /// against it rather than panicking).
    pub fn spawn(
        &self,
        session: ConversationSession,
        character_name: String,
        npc_name: String,
        npc_facts: Vec<String>,
    ) {
        let character_id = session.character_id.clone();
        {
            let mut active = self.active.lock().expect("conversation executor mutex poisoned");
            if !active.insert(character_id.clone()) {
                warn!(character_id = %character_id, "conversation turn loop already running, ignoring spawn");
                return;
            }
        }

        let llm = Arc::clone(&self.llm);
        let post_processor = Arc::clone(&self.post_processor);
        let turn_interval = self.turn_interval;
        let sender = self.sender.clone();
        let active = Arc::clone(&self.active);

        tokio::spawn(async move {
            let outcome = run_loop(
                llm.as_ref(),
                post_processor.as_ref(),
                session.clone(),
                &character_name,
                &npc_name,
                &npc_facts,
                turn_interval,
                &sender,
            )
            .await;

            active.lock().expect("conversation executor mutex poisoned").remove(&character_id);
            let _ = sender
                .send(ConversationEvent::Completed { character_id, outcome })
                .await;
        });
    }

    pub fn is_active(&self, character_id: &CharacterId) -> bool {
        self.active.lock().expect("conversation executor mutex poisoned").contains(character_id)
    }
}

/// The alternating-turn loop itself: character speaks (reporting whether
/// it believes `successCriteria` is met), then — unless that ends it — the
/// NPC replies. Ends when the character's own utterance reports
/// `goalAchieved` (spec.md §8 scenario S3: 3 LLM calls — char, npc, char —
/// ending right after the second character turn, no trailing NPC call) or
/// when `maxTurns` is exhausted (scenario S4: 10 turns × 2 calls = 20,
/// never ending early).
async fn run_loop(
    llm: &dyn LLMClient,
    post_processor: &ConversationPostProcessor,
    mut session: ConversationSession,
    character_name: &str,
    npc_name: &str,
    npc_facts: &[String],
    turn_interval: Duration,
    sender: &mpsc::Sender<ConversationEvent>,
) -> ConversationOutcome {
    let mut goal_achieved = false;

    'turns: while session.current_turn() < session.max_turns {
        let character_turn = generate_character_turn(llm, character_name, &session, npc_facts).await;
        let (character_line, achieved, llm_failed) = match character_turn {
            Ok((line, achieved)) => (line, achieved, false),
            Err(err) => {
                warn!(character_id = %session.character_id, error = %err, "character turn LLM call failed");
                (CHARACTER_FALLBACK_UTTERANCE.to_string(), false, true)
            }
        };
        let character_message = Message {
            speaker: Speaker::Character,
            name: character_name.to_string(),
            utterance: character_line,
        };
        session.messages.push(character_message.clone());
        let _ = sender
            .send(ConversationEvent::MessageEmitted {
                character_id: session.character_id.clone(),
                message: character_message,
            })
            .await;

        if achieved {
            goal_achieved = true;
            break;
        }
        if llm_failed {
            // spec.md §4.8 step 5 / §7: substitute the fallback and
            // terminate — no trailing NPC turn is attempted.
            break 'turns;
        }

        if !turn_interval.is_zero() {
            tokio::time::sleep(turn_interval).await;
        }

        let npc_turn = generate_npc_turn(llm, npc_name, &session, npc_facts).await;
        let (npc_line, llm_failed) = match npc_turn {
            Ok(line) => (line, false),
            Err(err) => {
                warn!(character_id = %session.character_id, error = %err, "npc turn LLM call failed");
                (NPC_FALLBACK_UTTERANCE.to_string(), true)
            }
        };
        let npc_message = Message {
            speaker: Speaker::Npc,
            name: npc_name.to_string(),
            utterance: npc_line,
        };
        session.messages.push(npc_message.clone());
        let _ = sender
            .send(ConversationEvent::MessageEmitted {
                character_id: session.character_id.clone(),
                message: npc_message,
            })
            .await;

        if llm_failed {
            break 'turns;
        }

        if !turn_interval.is_zero() {
            tokio::time::sleep(turn_interval).await;
        }
    }

    session.goal_achieved = goal_achieved;

    let npc_snapshot = NpcSnapshot { name: npc_name.to_string(), facts: npc_facts.to_vec() };
    let extraction = post_processor
        .extract(&session, &npc_snapshot.as_npc())
        .await
        .map_err(|err| {
            warn!(character_id = %session.character_id, error = %err, "post-processing extraction failed");
            err
        })
        .ok();

    ConversationOutcome { messages: session.messages, goal_achieved, extraction }
}

/// A minimal stand-in for `ts_world::Npc` carrying only the fields
/// `ConversationPostProcessor::extract` reads, so the background task
/// never needs a `WorldState` reference.
struct NpcSnapshot {
    name: String,
    facts: Vec<String>,
}

impl NpcSnapshot {
    fn as_npc(&self) -> ts_world::Npc {
        let mut npc = ts_world::Npc::new(
            ts_core::NpcId::new(String::new()),
            self.name.clone(),
            ts_core::MapId::new(String::new()),
            ts_core::NodeId::new(String::new()),
            ts_spatial::Position { x: 0.0, y: 0.0 },
        );
        npc.facts = self.facts.clone();
        npc
    }
}

/// The character's turn reports whether it believes `successCriteria` has
/// been met (spec.md §8 scenario S3/S4) — the NPC side never does.
async fn generate_character_turn(
    llm: &dyn LLMClient,
    character_name: &str,
    session: &ConversationSession,
    npc_facts: &[String],
) -> Result<(String, bool), BehaviorError> {
    let prompt = build_turn_prompt(character_name, session, npc_facts);
    let request = GenerateObjectRequest { prompt, schema: SchemaKind::CharacterUtterance, system: None };
    let value = llm.generate_object(request).await?;
    let response: CharacterUtteranceResponse = serde_json::from_value(value)
        .map_err(|e| BehaviorError::SchemaMismatch("character-utterance", e.to_string()))?;
    Ok((response.utterance, response.goal_achieved))
}

async fn generate_npc_turn(
    llm: &dyn LLMClient,
    npc_name: &str,
    session: &ConversationSession,
    npc_facts: &[String],
) -> Result<String, BehaviorError> {
    let prompt = build_turn_prompt(npc_name, session, npc_facts);
    let request = GenerateObjectRequest { prompt, schema: SchemaKind::NpcUtterance, system: None };
    let value = llm.generate_object(request).await?;
    let response: UtteranceResponse = serde_json::from_value(value)
        .map_err(|e| BehaviorError::SchemaMismatch("npc-utterance", e.to_string()))?;
    Ok(response.utterance)
}

fn build_turn_prompt(speaker_name: &str, session: &ConversationSession, npc_facts: &[String]) -> String {
    let transcript = session
        .messages
        .iter()
        .map(|m| format!("{}: {}", m.name, m.utterance))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You are {speaker}. Goal: \"{goal}\" (success: \"{criteria}\"). Known facts: {facts:?}\n{transcript}\n{speaker}:",
        speaker = speaker_name,
        goal = session.goal.goal,
        criteria = session.goal.success_criteria,
        facts = npc_facts,
    )
}

#[derive(serde::Deserialize)]
struct UtteranceResponse {
    utterance: String,
}

#[derive(serde::Deserialize)]
struct CharacterUtteranceResponse {
    utterance: String,
    #[serde(default)]
    goal_achieved: bool,
}
