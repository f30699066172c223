// SQLite persistence layer for draft picks, targets and key-value state.

use std::collections::HashMap;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use pickwatch_core::rankings::player::{PlayerId, RankingRecord};

/// A pick as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPick {
    pub pick_number: u32,
    pub player_id: PlayerId,
    /// UTC time the pick was recorded, ISO-8601.
    pub timestamp: String,
}

/// SQLite-backed persistence for the draft log, saved targets and
/// key-value draft state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS draft_picks (
                pick_number INTEGER NOT NULL,
                player_id   INTEGER NOT NULL,
                draft_id    TEXT NOT NULL DEFAULT '',
                timestamp   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (pick_number, draft_id)
            );

            CREATE INDEX IF NOT EXISTS idx_draft_picks_draft_id ON draft_picks(draft_id);

            CREATE TABLE IF NOT EXISTS targets (
                draft_id  TEXT NOT NULL,
                player_id INTEGER NOT NULL,
                ordinal   INTEGER NOT NULL,
                PRIMARY KEY (draft_id, player_id)
            );

            CREATE TABLE IF NOT EXISTS draft_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self { conn })
    }

    // ------------------------------------------------------------------
    // Draft picks
    // ------------------------------------------------------------------

    /// Record a pick. Re-recording an existing pick number is a no-op.
    /// Returns whether a row was written.
    pub fn record_pick(&self, pick_number: u32, player_id: PlayerId, draft_id: &str) -> Result<bool> {
        let written = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO draft_picks (pick_number, player_id, draft_id)
                 VALUES (?1, ?2, ?3)",
                params![pick_number, player_id, draft_id],
            )
            .context("failed to record draft pick")?;
        Ok(written > 0)
    }

    /// Remove a pick (undo). Returns whether a row was deleted.
    pub fn delete_pick(&self, pick_number: u32, draft_id: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute(
                "DELETE FROM draft_picks WHERE pick_number = ?1 AND draft_id = ?2",
                params![pick_number, draft_id],
            )
            .context("failed to delete draft pick")?;
        Ok(deleted > 0)
    }

    /// Picks for `draft_id`, ordered by pick number.
    pub fn load_picks(&self, draft_id: &str) -> Result<Vec<StoredPick>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT pick_number, player_id, timestamp
                 FROM draft_picks WHERE draft_id = ?1 ORDER BY pick_number",
            )
            .context("failed to prepare load_picks query")?;

        let picks = stmt
            .query_map(params![draft_id], |row| {
                Ok(StoredPick {
                    pick_number: row.get(0)?,
                    player_id: row.get(1)?,
                    timestamp: row.get(2)?,
                })
            })
            .context("failed to query draft picks")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map draft pick rows")?;

        Ok(picks)
    }

    pub fn has_draft_in_progress(&self, draft_id: &str) -> Result<bool> {
        let exists: bool = self
            .conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM draft_picks WHERE draft_id = ?1)",
                params![draft_id],
                |row| row.get(0),
            )
            .context("failed to check draft_picks existence")?;
        Ok(exists)
    }

    pub fn pick_count(&self, draft_id: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM draft_picks WHERE draft_id = ?1",
                params![draft_id],
                |row| row.get(0),
            )
            .context("failed to count draft picks")?;
        Ok(count as usize)
    }

    // ------------------------------------------------------------------
    // Targets
    // ------------------------------------------------------------------

    /// Replace the saved target list for `draft_id` wholesale.
    pub fn save_targets(&mut self, draft_id: &str, targets: &[PlayerId]) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .context("failed to begin targets transaction")?;
        tx.execute("DELETE FROM targets WHERE draft_id = ?1", params![draft_id])
            .context("failed to clear targets")?;
        for (ordinal, &player_id) in targets.iter().enumerate() {
            tx.execute(
                "INSERT OR IGNORE INTO targets (draft_id, player_id, ordinal) VALUES (?1, ?2, ?3)",
                params![draft_id, player_id, ordinal as i64],
            )
            .context("failed to insert target")?;
        }
        tx.commit().context("failed to commit targets")?;
        Ok(())
    }

    /// Saved targets for `draft_id`, in the order they were saved.
    pub fn load_targets(&self, draft_id: &str) -> Result<Vec<PlayerId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT player_id FROM targets WHERE draft_id = ?1 ORDER BY ordinal")
            .context("failed to prepare load_targets query")?;
        let targets = stmt
            .query_map(params![draft_id], |row| row.get(0))
            .context("failed to query targets")?
            .collect::<std::result::Result<Vec<PlayerId>, _>>()
            .context("failed to map target rows")?;
        Ok(targets)
    }

    // ------------------------------------------------------------------
    // Key-value state
    // ------------------------------------------------------------------

    /// Persist a JSON value under `key`, overwriting any previous value.
    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let json_str = serde_json::to_string(value).context("failed to serialize state value")?;
        self.conn
            .execute(
                "INSERT OR REPLACE INTO draft_state (key, value) VALUES (?1, ?2)",
                params![key, json_str],
            )
            .context("failed to save state")?;
        Ok(())
    }

    /// Load a previously saved JSON value by `key`.
    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM draft_state WHERE key = ?1")
            .context("failed to prepare load_state query")?;

        let mut rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .context("failed to query draft state")?;

        match rows.next() {
            Some(row_result) => {
                let json_str = row_result.context("failed to read state row")?;
                let value = serde_json::from_str(&json_str)
                    .context("failed to deserialize state value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    const CUSTOM_RANKS_KEY: &'static str = "custom_ranks";

    /// Save user-edited rankings, keyed by player id.
    pub fn save_custom_ranks(&self, ranks: &HashMap<PlayerId, RankingRecord>) -> Result<()> {
        let value = serde_json::to_value(ranks).context("failed to serialize custom ranks")?;
        self.save_state(Self::CUSTOM_RANKS_KEY, &value)
    }

    /// Saved custom rankings, or an empty map when none were saved.
    pub fn load_custom_ranks(&self) -> Result<HashMap<PlayerId, RankingRecord>> {
        match self.load_state(Self::CUSTOM_RANKS_KEY)? {
            Some(value) => {
                serde_json::from_value(value).context("failed to deserialize custom ranks")
            }
            None => Ok(HashMap::new()),
        }
    }

    /// Delete every pick, target and state entry. Custom rankings outlive
    /// the draft and are kept.
    pub fn clear_draft(&mut self) -> Result<()> {
        let tx = self.conn.transaction().context("failed to begin transaction")?;
        tx.execute("DELETE FROM draft_picks", [])
            .context("failed to delete draft picks")?;
        tx.execute("DELETE FROM targets", [])
            .context("failed to delete targets")?;
        tx.execute(
            "DELETE FROM draft_state WHERE key != ?1",
            params![Self::CUSTOM_RANKS_KEY],
        )
        .context("failed to delete draft state")?;
        tx.commit().context("failed to commit clear_draft")?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Draft ID management
    // ------------------------------------------------------------------

    const DRAFT_ID_KEY: &'static str = "current_draft_id";

    pub fn get_draft_id(&self) -> Result<Option<String>> {
        let value = self.load_state(Self::DRAFT_ID_KEY)?;
        Ok(value.and_then(|v| v.as_str().map(str::to_string)))
    }

    pub fn set_draft_id(&self, draft_id: &str) -> Result<()> {
        self.save_state(
            Self::DRAFT_ID_KEY,
            &serde_json::Value::String(draft_id.to_string()),
        )
    }

    /// New draft ID from the current UTC time, e.g. `draft_20260916_193005_412`.
    pub fn generate_draft_id() -> String {
        chrono::Utc::now().format("draft_%Y%m%d_%H%M%S_%3f").to_string()
    }
}
