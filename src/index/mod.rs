//! Vector index abstraction.
//!
//! [`VectorIndex`] is the seam between the memory service and whatever stores the
//! log vectors. Two backends ship: [`sqlite::SqliteVectorIndex`] (sqlite-vec in the
//! local database) and [`qdrant::QdrantIndex`] (Qdrant over REST).

pub mod qdrant;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::config::VectorIndexConfig;
use crate::memory::types::SearchResult;

/// Storage and similarity search for log vectors.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Short backend identifier, reported by `/health`.
    fn backend_name(&self) -> &'static str;

    /// Create the collection with `dimensions`-wide vectors and cosine distance
    /// if it does not exist yet.
    async fn ensure_collection(&self, dimensions: usize) -> Result<()>;

    /// Store `vector` under `id` with `payload` attached. Replaces any point with the same id.
    async fn upsert(&self, id: &str, vector: Vec<f32>, payload: serde_json::Value) -> Result<()>;

    /// Up to `limit` nearest points, best first.
    async fn search(&self, vector: Vec<f32>, limit: usize) -> Result<Vec<SearchResult>>;

    /// Number of stored points.
    async fn count(&self) -> Result<u64>;
}

/// Build the configured backend. The SQLite backend shares `db` with the waitlist store.
pub fn create_index(
    config: &VectorIndexConfig,
    db: Arc<Mutex<Connection>>,
) -> Result<Arc<dyn VectorIndex>> {
    match config.backend.as_str() {
        "sqlite" => Ok(Arc::new(sqlite::SqliteVectorIndex::new(db))),
        "qdrant" => Ok(Arc::new(qdrant::QdrantIndex::new(config)?)),
        other => anyhow::bail!("unknown vector index backend: {other}. Supported: sqlite, qdrant"),
    }
}
