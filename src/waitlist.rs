//! Waitlist document store.
//!
//! [`WaitlistStore`] is keyed by email. The SQLite implementation enforces the
//! key with a PRIMARY KEY constraint, so a concurrent duplicate insert is
//! reported as [`InsertOutcome::Duplicate`] instead of creating a second row.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::sync::{Arc, Mutex};

use crate::memory::types::WaitlistEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

#[async_trait]
pub trait WaitlistStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<WaitlistEntry>>;

    async fn insert(&self, entry: &WaitlistEntry) -> Result<InsertOutcome>;

    async fn count(&self) -> Result<u64>;
}

pub struct SqliteWaitlistStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteWaitlistStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            f(&conn)
        })
        .await
        .context("db task failed")?
    }
}

#[async_trait]
impl WaitlistStore for SqliteWaitlistStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<WaitlistEntry>> {
        let email = email.to_string();
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    "SELECT full_name, email, company, joined_at FROM waitlist WHERE email = ?1",
                    params![email],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, Option<String>>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )
                .optional()?;

            row.map(|(full_name, email, company, joined_at)| -> Result<WaitlistEntry> {
                let joined_at = DateTime::parse_from_rfc3339(&joined_at)
                    .with_context(|| format!("bad joined_at for {email}: {joined_at}"))?
                    .with_timezone(&Utc);
                Ok(WaitlistEntry {
                    full_name,
                    email,
                    company,
                    joined_at,
                })
            })
            .transpose()
        })
        .await
    }

    async fn insert(&self, entry: &WaitlistEntry) -> Result<InsertOutcome> {
        let entry = entry.clone();
        self.with_conn(move |conn| {
            let result = conn.execute(
                "INSERT INTO waitlist (email, full_name, company, joined_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    entry.email,
                    entry.full_name,
                    entry.company,
                    entry.joined_at.to_rfc3339()
                ],
            );
            match result {
                Ok(_) => Ok(InsertOutcome::Inserted),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    Ok(InsertOutcome::Duplicate)
                }
                Err(e) => Err(e).context("failed to insert waitlist entry"),
            }
        })
        .await
    }

    async fn count(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM waitlist", [], |r| r.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}
