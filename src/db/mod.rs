mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{types::Type, Connection, Row};
use uuid::Uuid;

use crate::models::*;

/// Durable storage for attempts, keyed by a store-allocated id.
///
/// Every operation touches exactly one attempt, so implementations only need
/// atomic single-record writes.
pub trait AttemptStore: Send + Sync {
    /// Allocate the id for a new attempt. Nothing is written.
    fn new_attempt_id(&self) -> Uuid;

    fn insert_attempt(&self, attempt: &Attempt) -> Result<()>;

    fn get_attempt(&self, id: Uuid) -> Result<Option<Attempt>>;

    /// Overwrite the mutable fields of an existing attempt.
    /// Returns `false` when no record has that id.
    fn update_attempt(&self, attempt: &Attempt) -> Result<bool>;

    /// Newest first.
    fn list_attempts(&self, filter: &AttemptFilter) -> Result<Vec<Attempt>>;
}

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "phishing-sim")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("phishing-sim.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }
}

impl AttemptStore for Database {
    fn new_attempt_id(&self) -> Uuid {
        Uuid::new_v4()
    }

    fn insert_attempt(&self, attempt: &Attempt) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO attempts (id, email, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                attempt.id.to_string(),
                &attempt.email,
                attempt.status.as_str(),
                format_datetime(attempt.created_at),
                format_datetime(attempt.updated_at),
            ),
        )
        .with_context(|| format!("Failed to insert attempt {}", attempt.id))?;
        Ok(())
    }

    fn get_attempt(&self, id: Uuid) -> Result<Option<Attempt>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, email, status, created_at, updated_at
             FROM attempts WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(attempt_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    fn update_attempt(&self, attempt: &Attempt) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn
            .execute(
                "UPDATE attempts SET status = ?, updated_at = ? WHERE id = ?",
                (
                    attempt.status.as_str(),
                    format_datetime(attempt.updated_at),
                    attempt.id.to_string(),
                ),
            )
            .with_context(|| format!("Failed to update attempt {}", attempt.id))?;
        Ok(rows > 0)
    }

    fn list_attempts(&self, filter: &AttemptFilter) -> Result<Vec<Attempt>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, email, status, created_at, updated_at
             FROM attempts
             WHERE (?1 IS NULL OR status = ?1)
               AND (?2 IS NULL OR email = ?2)
             ORDER BY created_at DESC",
        )?;

        let status = filter.status.map(|s| s.as_str());
        let attempts = stmt
            .query_map((status, filter.email.as_deref()), attempt_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(attempts)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn attempt_from_row(row: &Row<'_>) -> rusqlite::Result<Attempt> {
    let status = row.get::<_, String>(2)?;
    let status = AttemptStatus::from_str(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            format!("unknown attempt status {:?}", status).into(),
        )
    })?;

    Ok(Attempt {
        id: parse_uuid(row.get::<_, String>(0)?),
        email: row.get(1)?,
        status,
        created_at: parse_datetime(row.get::<_, String>(3)?),
        updated_at: parse_datetime(row.get::<_, String>(4)?),
    })
}

/// Fixed-width RFC 3339 so stored timestamps sort lexically.
fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
