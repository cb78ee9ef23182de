//! `SqliteStore` — the durable embedded-SQL [`StateStore`] (spec.md §4.9:
//! "two implementations: (a) in-memory ... (b) durable embedded SQL"),
//! plus the [`ScheduleStore`]/[`ConversationStore`] facets over the same
//! connection (spec.md §4.6, §4.8).
//!
//! One connection behind a [`Mutex`] — `rusqlite::Connection` is `Send` but
//! not `Sync`, and spec.md §5 already restricts all store writes to a
//! single durable-writer task, so there is no contention to design around
//! beyond what the mutex gives for free.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use ts_conversation::{
    ConversationResult, ConversationStore, ConversationSummaryEntry, Importance, MidTermMemory,
    NpcDynamicState,
};
use ts_core::{ActionId, CharacterId, JobId, MapId, MemoryId, NodeId, NpcId, Stats, WorldTime};
use ts_schedule::entry::{ActionHistoryEntry, ScheduleEntry};
use ts_schedule::{ScheduleResult, ScheduleStore};
use ts_spatial::{Direction, Position};
use ts_world::{Employment, LlmProfile, NpcMood};

use crate::error::{PersistenceError, PersistenceResult};
use crate::record::CharacterRecord;
use crate::snapshot::StateSnapshot;
use crate::store::StateStore;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS character_states (
    id              TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    sprite          TEXT NOT NULL,
    employment      TEXT,
    money           INTEGER NOT NULL,
    satiety         REAL NOT NULL,
    bladder         REAL NOT NULL,
    energy          REAL NOT NULL,
    hygiene         REAL NOT NULL,
    mood            REAL NOT NULL,
    current_map_id  TEXT NOT NULL,
    current_node_id TEXT NOT NULL,
    position_x      REAL NOT NULL,
    position_y      REAL NOT NULL,
    direction       TEXT NOT NULL,
    profile         TEXT,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS world_time (
    id          INTEGER PRIMARY KEY CHECK (id = 1),
    hour        INTEGER NOT NULL,
    minute      INTEGER NOT NULL,
    day         INTEGER NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS server_state (
    id                 INTEGER PRIMARY KEY CHECK (id = 1),
    server_start_time  TEXT,
    current_map_id     TEXT,
    updated_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS schedules (
    character_id  TEXT NOT NULL,
    day           INTEGER NOT NULL,
    entries       TEXT NOT NULL,
    UNIQUE(character_id, day)
);

CREATE TABLE IF NOT EXISTS action_history (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    character_id      TEXT NOT NULL,
    day               INTEGER NOT NULL,
    time              TEXT NOT NULL,
    action_id         TEXT NOT NULL,
    target            TEXT,
    duration_minutes  INTEGER,
    reason            TEXT,
    episode           TEXT,
    created_at        TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_action_history_char_day ON action_history(character_id, day);

CREATE TABLE IF NOT EXISTS npc_states (
    npc_id             TEXT PRIMARY KEY,
    affinity           INTEGER NOT NULL,
    mood               TEXT NOT NULL,
    facts              TEXT NOT NULL,
    conversation_count INTEGER NOT NULL,
    last_conversation  TEXT
);

CREATE TABLE IF NOT EXISTS conversation_summaries (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    character_id     TEXT NOT NULL,
    npc_id           TEXT NOT NULL,
    day              INTEGER NOT NULL,
    summary          TEXT NOT NULL,
    topics_discussed TEXT NOT NULL,
    created_at       TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_conv_summaries_char_npc ON conversation_summaries(character_id, npc_id, id);

CREATE TABLE IF NOT EXISTS mid_term_memories (
    id             TEXT PRIMARY KEY,
    character_id   TEXT NOT NULL,
    content        TEXT NOT NULL,
    importance     TEXT NOT NULL,
    created_day    INTEGER NOT NULL,
    expires_day    INTEGER NOT NULL,
    source_npc_id  TEXT
);
CREATE INDEX IF NOT EXISTS idx_memories_char ON mid_term_memories(character_id);
"#;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// An ephemeral store backed by SQLite's `:memory:` database — the same
    /// schema and query paths as the durable file store, useful for tests
    /// that want to exercise the SQL layer itself rather than
    /// [`crate::memory::InMemoryStore`]'s plain `HashMap`s.
    pub fn open_in_memory() -> PersistenceResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> PersistenceResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("sqlite store mutex poisoned")
    }
}

fn direction_to_str(d: Direction) -> &'static str {
    match d {
        Direction::Up => "up",
        Direction::Down => "down",
        Direction::Left => "left",
        Direction::Right => "right",
    }
}

fn direction_from_str(s: &str) -> Direction {
    match s {
        "down" => Direction::Down,
        "left" => Direction::Left,
        "right" => Direction::Right,
        _ => Direction::Up,
    }
}

fn mood_to_str(m: NpcMood) -> &'static str {
    match m {
        NpcMood::Happy => "happy",
        NpcMood::Neutral => "neutral",
        NpcMood::Sad => "sad",
        NpcMood::Angry => "angry",
        NpcMood::Excited => "excited",
    }
}

fn mood_from_str(s: &str) -> NpcMood {
    match s {
        "happy" => NpcMood::Happy,
        "sad" => NpcMood::Sad,
        "angry" => NpcMood::Angry,
        "excited" => NpcMood::Excited,
        _ => NpcMood::Neutral,
    }
}

fn importance_to_str(i: Importance) -> &'static str {
    match i {
        Importance::Low => "low",
        Importance::Medium => "medium",
        Importance::High => "high",
    }
}

fn importance_from_str(s: &str) -> Importance {
    match s {
        "medium" => Importance::Medium,
        "high" => Importance::High,
        _ => Importance::Low,
    }
}

fn timestamp_to_str(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

fn timestamp_from_str(s: &str) -> PersistenceResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PersistenceError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

fn row_to_character_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<CharacterRecord> {
    let sprite_json: String = row.get("sprite")?;
    let employment_json: Option<String> = row.get("employment")?;
    let profile_json: Option<String> = row.get("profile")?;
    let direction_str: String = row.get("direction")?;

    let sprite = serde_json::from_str(&sprite_json).unwrap_or(serde_json::Value::Null);
    let job_id: Option<JobId> = employment_json
        .and_then(|s| serde_json::from_str::<Employment>(&s).ok())
        .map(|e| e.job_id);
    let profile: Option<LlmProfile> = profile_json.and_then(|s| serde_json::from_str(&s).ok());

    Ok(CharacterRecord {
        id: CharacterId::new(row.get::<_, String>("id")?),
        name: row.get("name")?,
        sprite,
        money: row.get("money")?,
        stats: Stats {
            satiety: row.get("satiety")?,
            bladder: row.get("bladder")?,
            energy: row.get("energy")?,
            hygiene: row.get("hygiene")?,
            mood: row.get("mood")?,
        },
        current_map_id: MapId::new(row.get::<_, String>("current_map_id")?),
        current_node_id: NodeId::new(row.get::<_, String>("current_node_id")?),
        position: Position { x: row.get("position_x")?, y: row.get("position_y")? },
        direction: direction_from_str(&direction_str),
        job_id,
        profile,
    })
}

impl StateStore for SqliteStore {
    fn save_state(&self, snapshot: &StateSnapshot) -> PersistenceResult<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let keep_ids: Vec<String> = snapshot.characters.iter().map(|c| c.id.as_str().to_string()).collect();
        {
            let mut stmt = tx.prepare("SELECT id FROM character_states")?;
            let existing: Vec<String> =
                stmt.query_map([], |row| row.get(0))?.collect::<Result<_, _>>()?;
            for id in existing {
                if !keep_ids.contains(&id) {
                    tx.execute("DELETE FROM character_states WHERE id = ?1", params![id])?;
                }
            }
        }

        for record in &snapshot.characters {
            upsert_character(&tx, record)?;
        }
        for npc in &snapshot.npcs {
            upsert_npc_state(&tx, npc)?;
        }

        let now = timestamp_to_str(Utc::now());
        tx.execute(
            "INSERT INTO world_time (id, hour, minute, day, updated_at) VALUES (1, ?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET hour = excluded.hour, minute = excluded.minute, day = excluded.day, updated_at = excluded.updated_at",
            params![snapshot.time.hour, snapshot.time.minute, snapshot.time.day as i64, now],
        )?;

        let current_map_id = snapshot.current_map_id.as_ref().map(|m| m.as_str().to_string());
        let server_start_time = timestamp_to_str(snapshot.server_start_time);
        tx.execute(
            "INSERT INTO server_state (id, server_start_time, current_map_id, updated_at) VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                server_start_time = COALESCE(excluded.server_start_time, server_state.server_start_time),
                current_map_id = COALESCE(excluded.current_map_id, server_state.current_map_id),
                updated_at = excluded.updated_at",
            params![server_start_time, current_map_id, now],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn load_state(&self) -> PersistenceResult<Option<StateSnapshot>> {
        let conn = self.lock();
        let server_start_time: Option<String> = conn
            .query_row("SELECT server_start_time FROM server_state WHERE id = 1", [], |row| row.get(0))
            .optional()?
            .flatten();
        let Some(server_start_time) = server_start_time else {
            return Ok(None);
        };
        let server_start_time = timestamp_from_str(&server_start_time)?;

        let current_map_id: Option<String> = conn
            .query_row("SELECT current_map_id FROM server_state WHERE id = 1", [], |row| row.get(0))
            .optional()?
            .flatten();

        let time = load_world_time(&conn)?.unwrap_or(WorldTime::ZERO);

        let mut stmt = conn.prepare("SELECT * FROM character_states")?;
        let characters = stmt
            .query_map([], row_to_character_record)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare("SELECT * FROM npc_states")?;
        let npcs = stmt
            .query_map([], row_to_npc_state)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(StateSnapshot {
            time,
            current_map_id: current_map_id.map(MapId::new),
            server_start_time,
            characters,
            npcs,
        }))
    }

    fn save_character(&self, record: &CharacterRecord) -> PersistenceResult<()> {
        let conn = self.lock();
        upsert_character(&conn, record)
    }

    fn load_character(&self, id: &CharacterId) -> PersistenceResult<Option<CharacterRecord>> {
        let conn = self.lock();
        conn.query_row(
            "SELECT * FROM character_states WHERE id = ?1",
            params![id.as_str()],
            row_to_character_record,
        )
        .optional()
        .map_err(PersistenceError::from)
    }

    fn load_all_characters(&self) -> PersistenceResult<Vec<CharacterRecord>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT * FROM character_states")?;
        let rows = stmt.query_map([], row_to_character_record)?.collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn delete_character(&self, id: &CharacterId) -> PersistenceResult<()> {
        let conn = self.lock();
        conn.execute("DELETE FROM character_states WHERE id = ?1", params![id.as_str()])?;
        Ok(())
    }

    fn save_time(&self, time: WorldTime) -> PersistenceResult<()> {
        let conn = self.lock();
        let now = timestamp_to_str(Utc::now());
        conn.execute(
            "INSERT INTO world_time (id, hour, minute, day, updated_at) VALUES (1, ?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET hour = excluded.hour, minute = excluded.minute, day = excluded.day, updated_at = excluded.updated_at",
            params![time.hour, time.minute, time.day as i64, now],
        )?;
        Ok(())
    }

    fn load_time(&self) -> PersistenceResult<Option<WorldTime>> {
        load_world_time(&self.lock())
    }

    fn save_current_map_id(&self, map_id: Option<&MapId>) -> PersistenceResult<()> {
        let conn = self.lock();
        let now = timestamp_to_str(Utc::now());
        conn.execute(
            "INSERT INTO server_state (id, current_map_id, updated_at) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET current_map_id = excluded.current_map_id, updated_at = excluded.updated_at",
            params![map_id.map(|m| m.as_str().to_string()), now],
        )?;
        Ok(())
    }

    fn load_current_map_id(&self) -> PersistenceResult<Option<MapId>> {
        let conn = self.lock();
        let map_id: Option<String> = conn
            .query_row("SELECT current_map_id FROM server_state WHERE id = 1", [], |row| row.get(0))
            .optional()?
            .flatten();
        Ok(map_id.map(MapId::new))
    }

    fn save_server_start_time(&self, at: DateTime<Utc>) -> PersistenceResult<()> {
        let conn = self.lock();
        let now = timestamp_to_str(Utc::now());
        conn.execute(
            "INSERT INTO server_state (id, server_start_time, updated_at) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET server_start_time = excluded.server_start_time, updated_at = excluded.updated_at",
            params![timestamp_to_str(at), now],
        )?;
        Ok(())
    }

    fn load_server_start_time(&self) -> PersistenceResult<Option<DateTime<Utc>>> {
        let conn = self.lock();
        let raw: Option<String> = conn
            .query_row("SELECT server_start_time FROM server_state WHERE id = 1", [], |row| row.get(0))
            .optional()?
            .flatten();
        raw.map(|s| timestamp_from_str(&s)).transpose()
    }
}

fn upsert_character(conn: &Connection, record: &CharacterRecord) -> PersistenceResult<()> {
    let sprite_json = serde_json::to_string(&record.sprite)?;
    let employment_json = record
        .job_id
        .as_ref()
        .map(|job_id| serde_json::to_string(&Employment { job_id: job_id.clone() }))
        .transpose()?;
    let profile_json = record.profile.as_ref().map(serde_json::to_string).transpose()?;
    let now = timestamp_to_str(Utc::now());

    conn.execute(
        "INSERT INTO character_states (
            id, name, sprite, employment, money, satiety, bladder, energy, hygiene, mood,
            current_map_id, current_node_id, position_x, position_y, direction, profile, updated_at
        ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name, sprite = excluded.sprite, employment = excluded.employment,
            money = excluded.money, satiety = excluded.satiety, bladder = excluded.bladder,
            energy = excluded.energy, hygiene = excluded.hygiene, mood = excluded.mood,
            current_map_id = excluded.current_map_id, current_node_id = excluded.current_node_id,
            position_x = excluded.position_x, position_y = excluded.position_y,
            direction = excluded.direction, profile = excluded.profile, updated_at = excluded.updated_at",
        params![
            record.id.as_str(),
            record.name,
            sprite_json,
            employment_json,
            record.money,
            record.stats.satiety,
            record.stats.bladder,
            record.stats.energy,
            record.stats.hygiene,
            record.stats.mood,
            record.current_map_id.as_str(),
            record.current_node_id.as_str(),
            record.position.x,
            record.position.y,
            direction_to_str(record.direction),
            profile_json,
            now,
        ],
    )?;
    Ok(())
}

fn load_world_time(conn: &Connection) -> PersistenceResult<Option<WorldTime>> {
    conn.query_row("SELECT hour, minute, day FROM world_time WHERE id = 1", [], |row| {
        Ok(WorldTime { hour: row.get(0)?, minute: row.get(1)?, day: row.get::<_, i64>(2)? as u64 })
    })
    .optional()
    .map_err(PersistenceError::from)
}

fn row_to_npc_state(row: &rusqlite::Row<'_>) -> rusqlite::Result<NpcDynamicState> {
    let facts_json: String = row.get("facts")?;
    let mood_str: String = row.get("mood")?;
    let last_conversation: Option<String> = row.get("last_conversation")?;
    Ok(NpcDynamicState {
        npc_id: NpcId::new(row.get::<_, String>("npc_id")?),
        affinity: row.get("affinity")?,
        mood: mood_from_str(&mood_str),
        facts: serde_json::from_str(&facts_json).unwrap_or_default(),
        conversation_count: row.get::<_, i64>("conversation_count")? as u32,
        last_conversation: last_conversation.and_then(|s| timestamp_from_str(&s).ok()),
    })
}

fn upsert_npc_state(conn: &Connection, state: &NpcDynamicState) -> PersistenceResult<()> {
    let facts_json = serde_json::to_string(&state.facts)?;
    let last_conversation = state.last_conversation.map(timestamp_to_str);
    conn.execute(
        "INSERT INTO npc_states (npc_id, affinity, mood, facts, conversation_count, last_conversation)
         VALUES (?1,?2,?3,?4,?5,?6)
         ON CONFLICT(npc_id) DO UPDATE SET
            affinity = excluded.affinity, mood = excluded.mood, facts = excluded.facts,
            conversation_count = excluded.conversation_count, last_conversation = excluded.last_conversation",
        params![
            state.npc_id.as_str(),
            state.affinity,
            mood_to_str(state.mood),
            facts_json,
            state.conversation_count,
            last_conversation,
        ],
    )?;
    Ok(())
}

impl ScheduleStore for SqliteStore {
    fn save_schedule(&self, character: &CharacterId, day: u64, entries: &[ScheduleEntry]) -> ScheduleResult<()> {
        let conn = self.lock();
        let entries_json = serde_json::to_string(entries).map_err(PersistenceError::from)?;
        conn.execute(
            "INSERT INTO schedules (character_id, day, entries) VALUES (?1, ?2, ?3)
             ON CONFLICT(character_id, day) DO UPDATE SET entries = excluded.entries",
            params![character.as_str(), day as i64, entries_json],
        )
        .map_err(PersistenceError::from)?;
        Ok(())
    }

    fn load_schedule(&self, character: &CharacterId, day: u64) -> ScheduleResult<Option<Vec<ScheduleEntry>>> {
        let conn = self.lock();
        let raw: Option<String> = conn
            .query_row(
                "SELECT entries FROM schedules WHERE character_id = ?1 AND day = ?2",
                params![character.as_str(), day as i64],
                |row| row.get(0),
            )
            .optional()
            .map_err(PersistenceError::from)?;
        match raw {
            Some(json) => {
                let entries: Vec<ScheduleEntry> = serde_json::from_str(&json).map_err(PersistenceError::from)?;
                Ok(Some(entries))
            }
            None => Ok(None),
        }
    }

    fn delete_schedule(&self, character: &CharacterId, day: u64) -> ScheduleResult<()> {
        let conn = self.lock();
        conn.execute(
            "DELETE FROM schedules WHERE character_id = ?1 AND day = ?2",
            params![character.as_str(), day as i64],
        )
        .map_err(PersistenceError::from)?;
        Ok(())
    }

    fn append_history(&self, character: &CharacterId, day: u64, entry: &ActionHistoryEntry) -> ScheduleResult<()> {
        let conn = self.lock();
        let now = timestamp_to_str(Utc::now());
        conn.execute(
            "INSERT INTO action_history (character_id, day, time, action_id, target, duration_minutes, reason, episode, created_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
            params![
                character.as_str(),
                day as i64,
                entry.time,
                entry.action_id.as_str(),
                entry.target,
                entry.duration_minutes,
                entry.reason,
                entry.episode,
                now,
            ],
        )
        .map_err(PersistenceError::from)?;
        Ok(())
    }

    fn load_history(&self, character: &CharacterId, day: u64) -> ScheduleResult<Vec<ActionHistoryEntry>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT time, action_id, target, duration_minutes, reason, episode FROM action_history
                 WHERE character_id = ?1 AND day = ?2 ORDER BY id",
            )
            .map_err(PersistenceError::from)?;
        let rows = stmt
            .query_map(params![character.as_str(), day as i64], |row| {
                Ok(ActionHistoryEntry {
                    time: row.get(0)?,
                    action_id: ActionId::new(row.get::<_, String>(1)?),
                    target: row.get(2)?,
                    duration_minutes: row.get(3)?,
                    reason: row.get(4)?,
                    episode: row.get(5)?,
                })
            })
            .map_err(PersistenceError::from)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(PersistenceError::from)?;
        Ok(rows)
    }

    fn backfill_episode(&self, character: &CharacterId, day: u64, time: &str, episode: &str) -> ScheduleResult<()> {
        let conn = self.lock();
        conn.execute(
            "UPDATE action_history SET episode = ?1 WHERE id = (
                SELECT id FROM action_history
                WHERE character_id = ?2 AND day = ?3 AND time = ?4
                ORDER BY id DESC LIMIT 1
            )",
            params![episode, character.as_str(), day as i64, time],
        )
        .map_err(PersistenceError::from)?;
        Ok(())
    }
}

impl ConversationStore for SqliteStore {
    fn save_npc_state(&self, state: &NpcDynamicState) -> ConversationResult<()> {
        let conn = self.lock();
        upsert_npc_state(&conn, state)?;
        Ok(())
    }

    fn load_npc_state(&self, npc_id: &NpcId) -> ConversationResult<Option<NpcDynamicState>> {
        let conn = self.lock();
        conn.query_row(
            "SELECT * FROM npc_states WHERE npc_id = ?1",
            params![npc_id.as_str()],
            row_to_npc_state,
        )
        .optional()
        .map_err(|e| PersistenceError::from(e).into())
    }

    fn save_conversation_summary(&self, entry: &ConversationSummaryEntry) -> ConversationResult<()> {
        let conn = self.lock();
        let topics_json = serde_json::to_string(&entry.topics_discussed).map_err(PersistenceError::from)?;
        conn.execute(
            "INSERT INTO conversation_summaries (character_id, npc_id, day, summary, topics_discussed, created_at)
             VALUES (?1,?2,?3,?4,?5,?6)",
            params![
                entry.character_id.as_str(),
                entry.npc_id.as_str(),
                entry.day as i64,
                entry.summary,
                topics_json,
                timestamp_to_str(entry.created_at),
            ],
        )
        .map_err(PersistenceError::from)?;
        Ok(())
    }

    fn recent_conversation_summaries(
        &self,
        character_id: &CharacterId,
        npc_id: &NpcId,
        limit: u32,
    ) -> ConversationResult<Vec<ConversationSummaryEntry>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT day, summary, topics_discussed, created_at FROM conversation_summaries
                 WHERE character_id = ?1 AND npc_id = ?2 ORDER BY id DESC LIMIT ?3",
            )
            .map_err(PersistenceError::from)?;
        let rows = stmt
            .query_map(params![character_id.as_str(), npc_id.as_str(), limit], |row| {
                let topics_json: String = row.get(2)?;
                let created_at: String = row.get(3)?;
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, topics_json, created_at))
            })
            .map_err(PersistenceError::from)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(PersistenceError::from)?;

        let mut out = Vec::with_capacity(rows.len());
        for (day, summary, topics_json, created_at) in rows {
            let topics_discussed: Vec<String> = serde_json::from_str(&topics_json).map_err(PersistenceError::from)?;
            let created_at = timestamp_from_str(&created_at)?;
            out.push(ConversationSummaryEntry {
                character_id: character_id.clone(),
                npc_id: npc_id.clone(),
                day: day as u64,
                summary,
                topics_discussed,
                created_at,
            });
        }
        Ok(out)
    }

    fn append_memory(&self, memory: &MidTermMemory) -> ConversationResult<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO mid_term_memories (id, character_id, content, importance, created_day, expires_day, source_npc_id)
             VALUES (?1,?2,?3,?4,?5,?6,?7)
             ON CONFLICT(id) DO UPDATE SET content = excluded.content, importance = excluded.importance,
                created_day = excluded.created_day, expires_day = excluded.expires_day,
                source_npc_id = excluded.source_npc_id",
            params![
                memory.id.as_str(),
                memory.character_id.as_str(),
                memory.content,
                importance_to_str(memory.importance),
                memory.created_day as i64,
                memory.expires_day as i64,
                memory.source_npc_id.as_ref().map(|id| id.as_str().to_string()),
            ],
        )
        .map_err(PersistenceError::from)?;
        Ok(())
    }

    fn active_memories(&self, character_id: &CharacterId, current_day: u64) -> ConversationResult<Vec<MidTermMemory>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, content, importance, created_day, expires_day, source_npc_id FROM mid_term_memories
                 WHERE character_id = ?1 AND expires_day >= ?2",
            )
            .map_err(PersistenceError::from)?;
        let rows = stmt
            .query_map(params![character_id.as_str(), current_day as i64], |row| {
                let importance_str: String = row.get(2)?;
                let source_npc_id: Option<String> = row.get(5)?;
                Ok(MidTermMemory {
                    id: MemoryId::new(row.get::<_, String>(0)?),
                    character_id: character_id.clone(),
                    content: row.get(1)?,
                    importance: importance_from_str(&importance_str),
                    created_day: row.get::<_, i64>(3)? as u64,
                    expires_day: row.get::<_, i64>(4)? as u64,
                    source_npc_id: source_npc_id.map(NpcId::new),
                })
            })
            .map_err(PersistenceError::from)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(PersistenceError::from)?;
        Ok(rows)
    }

    fn purge_expired_memories(&self, current_day: u64) -> ConversationResult<u64> {
        let conn = self.lock();
        let removed = conn
            .execute("DELETE FROM mid_term_memories WHERE expires_day < ?1", params![current_day as i64])
            .map_err(PersistenceError::from)?;
        Ok(removed as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ts_core::FacilityId;

    fn sample_record(id: &str) -> CharacterRecord {
        CharacterRecord {
            id: CharacterId::new(id),
            name: "Test".to_string(),
            sprite: serde_json::json!({"sheet": "default"}),
            money: 100,
            stats: Stats::default(),
            current_map_id: MapId::new("town"),
            current_node_id: NodeId::new("n1"),
            position: Position { x: 1.0, y: 2.0 },
            direction: Direction::Down,
            job_id: None,
            profile: None,
        }
    }

    #[test]
    fn round_trips_a_character_record() {
        let store = SqliteStore::open_in_memory().unwrap();
        let record = sample_record("char-1");
        store.save_character(&record).unwrap();
        let loaded = store.load_character(&CharacterId::new("char-1")).unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn save_state_deletes_characters_absent_from_the_payload() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_character(&sample_record("char-1")).unwrap();

        let snapshot = StateSnapshot {
            time: WorldTime::ZERO,
            current_map_id: Some(MapId::new("town")),
            server_start_time: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            characters: vec![sample_record("char-2")],
            npcs: vec![],
        };
        store.save_state(&snapshot).unwrap();

        assert!(store.load_character(&CharacterId::new("char-1")).unwrap().is_none());
        assert!(store.load_character(&CharacterId::new("char-2")).unwrap().is_some());
    }

    #[test]
    fn server_start_time_survives_a_current_map_only_update() {
        let store = SqliteStore::open_in_memory().unwrap();
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        store.save_server_start_time(start).unwrap();
        store.save_current_map_id(Some(&MapId::new("town"))).unwrap();
        assert_eq!(store.load_server_start_time().unwrap(), Some(start));
        assert_eq!(store.load_current_map_id().unwrap(), Some(MapId::new("town")));
    }

    #[test]
    fn schedule_round_trips_and_deletes() {
        let store = SqliteStore::open_in_memory().unwrap();
        let character = CharacterId::new("char-1");
        let entries = vec![ScheduleEntry {
            time: "09:00".to_string(),
            activity: ActionId::new("work"),
            facility_id: Some(FacilityId::new("office")),
            reason: Some("job".to_string()),
        }];
        store.save_schedule(&character, 1, &entries).unwrap();
        assert_eq!(store.load_schedule(&character, 1).unwrap(), Some(entries));
        store.delete_schedule(&character, 1).unwrap();
        assert_eq!(store.load_schedule(&character, 1).unwrap(), None);
    }

    #[test]
    fn history_entries_are_appended_in_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        let character = CharacterId::new("char-1");
        for (time, action) in [("08:00", "wake"), ("09:00", "work")] {
            store
                .append_history(
                    &character,
                    1,
                    &ActionHistoryEntry {
                        time: time.to_string(),
                        action_id: ActionId::new(action),
                        target: None,
                        duration_minutes: None,
                        reason: None,
                        episode: None,
                    },
                )
                .unwrap();
        }
        let history = store.load_history(&character, 1).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].action_id, ActionId::new("wake"));
        assert_eq!(history[1].action_id, ActionId::new("work"));
    }

    #[test]
    fn backfill_episode_updates_the_most_recent_matching_row() {
        let store = SqliteStore::open_in_memory().unwrap();
        let character = CharacterId::new("char-1");
        let entry = ActionHistoryEntry {
            time: "12:00".to_string(),
            action_id: ActionId::new("talk"),
            target: None,
            duration_minutes: None,
            reason: None,
            episode: None,
        };
        store.append_history(&character, 1, &entry).unwrap();
        store.backfill_episode(&character, 1, "12:00", "had a nice chat").unwrap();
        let history = store.load_history(&character, 1).unwrap();
        assert_eq!(history[0].episode.as_deref(), Some("had a nice chat"));
    }

    #[test]
    fn active_memories_excludes_expired_rows() {
        let store = SqliteStore::open_in_memory().unwrap();
        let character = CharacterId::new("char-1");
        store
            .append_memory(&MidTermMemory {
                id: MemoryId::new("mem-1"),
                character_id: character.clone(),
                content: "met the baker".to_string(),
                importance: Importance::Low,
                created_day: 1,
                expires_day: 1,
                source_npc_id: None,
            })
            .unwrap();
        store
            .append_memory(&MidTermMemory {
                id: MemoryId::new("mem-2"),
                character_id: character.clone(),
                content: "learned a secret".to_string(),
                importance: Importance::High,
                created_day: 1,
                expires_day: 3,
                source_npc_id: None,
            })
            .unwrap();

        let active = store.active_memories(&character, 2).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, MemoryId::new("mem-2"));

        let purged = store.purge_expired_memories(2).unwrap();
        assert_eq!(purged, 1);
        assert_eq!(store.active_memories(&character, 1).unwrap().len(), 0);
    }
}
