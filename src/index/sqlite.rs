//! sqlite-vec backed vector index.
//!
//! Payloads live in `log_points`, vectors in the `log_vectors` vec0 table
//! (cosine metric). Both are written in one transaction per upsert.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

use super::VectorIndex;
use crate::memory::types::SearchResult;

/// Largest `k` sqlite-vec accepts in a KNN query.
const MAX_KNN: usize = 4096;

pub struct SqliteVectorIndex {
    db: Arc<Mutex<Connection>>,
}

impl SqliteVectorIndex {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    /// Run `f` against the shared connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            f(&mut conn)
        })
        .await
        .context("db task failed")?
    }
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn ensure_collection(&self, dimensions: usize) -> Result<()> {
        self.with_conn(move |conn| {
            crate::db::schema::init_schema(conn, dimensions)
                .context("failed to create log_vectors table")
        })
        .await
    }

    async fn upsert(&self, id: &str, vector: Vec<f32>, payload: serde_json::Value) -> Result<()> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let payload_json = serde_json::to_string(&payload)?;
            let now = chrono::Utc::now().to_rfc3339();

            let tx = conn.transaction()?;
            tx.execute(
                "INSERT OR REPLACE INTO log_points (id, payload, created_at) VALUES (?1, ?2, ?3)",
                params![id, payload_json, now],
            )?;
            // vec0 has no upsert; clear any previous vector for this id first.
            tx.execute("DELETE FROM log_vectors WHERE id = ?1", params![id])?;
            tx.execute(
                "INSERT INTO log_vectors (id, embedding) VALUES (?1, ?2)",
                params![id, vector_to_blob(&vector)],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn search(&self, vector: Vec<f32>, limit: usize) -> Result<Vec<SearchResult>> {
        let k = limit.min(MAX_KNN);
        if k == 0 {
            return Ok(Vec::new());
        }

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "WITH knn AS ( \
                     SELECT id, distance FROM log_vectors WHERE embedding MATCH ?1 AND k = ?2 \
                 ) \
                 SELECT knn.distance, p.payload FROM knn \
                 JOIN log_points p ON p.id = knn.id \
                 ORDER BY knn.distance",
            )?;

            let rows = stmt
                .query_map(params![vector_to_blob(&vector), k as i64], |row| {
                    Ok((row.get::<_, f64>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            rows.into_iter()
                .map(|(distance, payload)| {
                    Ok::<_, anyhow::Error>(SearchResult {
                        score: (1.0 - distance) as f32,
                        payload: serde_json::from_str(&payload)
                            .context("stored payload is not valid JSON")?,
                    })
                })
                .collect()
        })
        .await
    }

    async fn count(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM log_points", [], |r| r.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}

/// Little-endian f32 blob, the layout sqlite-vec expects for `FLOAT[n]` columns.
fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}
