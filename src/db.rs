//! Database module for the offer flow
//!
//! Durable storage for conversation flow state and for the upgrade
//! requests recorded by the external submission sink.

mod schema;

pub use schema::*;

use crate::state_machine::FlowState;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Corrupt state record for {id}: {source}")]
    CorruptState {
        id: String,
        source: serde_json::Error,
    },
    #[error("Failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Database connection lock poisoned")]
    Poisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Conversation Operations ====================

    /// Insert or replace the stored state of a conversation
    pub fn upsert_conversation(&self, state: &FlowState) -> DbResult<()> {
        let state_json = serde_json::to_string(state)?;
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO conversations (id, stage, state, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                stage = excluded.stage,
                state = excluded.state,
                updated_at = excluded.updated_at",
            params![
                state.conversation_id,
                state.stage.as_str(),
                state_json,
                state.created_at.to_rfc3339(),
                state.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get conversation state by ID, `None` if never stored
    pub fn get_conversation(&self, id: &str) -> DbResult<Option<FlowState>> {
        let conn = self.lock()?;
        let state_json: Option<String> = conn
            .query_row(
                "SELECT state FROM conversations WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        state_json
            .map(|json| {
                serde_json::from_str(&json).map_err(|source| DbError::CorruptState {
                    id: id.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Delete a conversation; returns whether a row existed
    pub fn delete_conversation(&self, id: &str) -> DbResult<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM conversations WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Count stored conversations
    #[allow(dead_code)] // Used in tests
    pub fn conversation_count(&self) -> DbResult<i64> {
        let conn = self.lock()?;
        let count = conn.query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))?;
        Ok(count)
    }

    // ==================== Upgrade Request Operations ====================

    /// Record a submitted decision
    pub fn insert_upgrade_request(&self, request: &UpgradeRequest) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO external_upgrade_requests (
                request_id, conversation_id, created_at, customer_id, customer_name,
                current_plan_mbps, offered_plan_mbps, status, external_reference
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                request.request_id,
                request.conversation_id,
                request.created_at.to_rfc3339(),
                request.customer_id,
                request.customer_name,
                request.current_plan_mbps,
                request.offered_plan_mbps,
                request.status,
                request.external_reference,
            ],
        )?;
        Ok(())
    }

    /// All upgrade requests recorded for a conversation, oldest first
    #[allow(dead_code)] // Used in tests
    pub fn get_upgrade_requests(&self, conversation_id: &str) -> DbResult<Vec<UpgradeRequest>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT request_id, conversation_id, created_at, customer_id, customer_name,
                    current_plan_mbps, offered_plan_mbps, status, external_reference
             FROM external_upgrade_requests
             WHERE conversation_id = ?1
             ORDER BY created_at ASC",
        )?;

        let rows = stmt.query_map(params![conversation_id], |row| {
            Ok(UpgradeRequest {
                request_id: row.get(0)?,
                conversation_id: row.get(1)?,
                created_at: parse_datetime(&row.get::<_, String>(2)?),
                customer_id: row.get(3)?,
                customer_name: row.get(4)?,
                current_plan_mbps: row.get(5)?,
                offered_plan_mbps: row.get(6)?,
                status: row.get(7)?,
                external_reference: row.get(8)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Run raw SQL against the connection (for breaking things in tests)
    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> DbResult<()> {
        self.lock()?.execute_batch(sql)?;
        Ok(())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
