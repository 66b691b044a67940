//! SQL DDL for the local backends.
//!
//! Defines `log_points` (event payloads), `log_vectors` (sqlite-vec `vec0`,
//! cosine metric), `waitlist` and `schema_meta`. All DDL uses `IF NOT EXISTS`
//! for idempotent initialization.

use rusqlite::{Connection, OptionalExtension};

/// Version written to `schema_meta` on first initialization.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = r#"
-- One row per ingested event; payload is the JSON the client posted
CREATE TABLE IF NOT EXISTS log_points (
    id TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_log_points_created ON log_points(created_at);

-- Waitlist signups; email is the unique key
CREATE TABLE IF NOT EXISTS waitlist (
    email TEXT PRIMARY KEY,
    full_name TEXT NOT NULL,
    company TEXT,
    joined_at TEXT NOT NULL
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// vec0 virtual table DDL (sqlite-vec syntax). The dimension is fixed at creation.
fn vec_table_sql(dimensions: usize) -> String {
    format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS log_vectors USING vec0(\n    \
         id TEXT PRIMARY KEY,\n    \
         embedding FLOAT[{dimensions}] distance_metric=cosine\n);"
    )
}

/// Initialize all schema tables. Idempotent.
pub fn init_schema(conn: &Connection, dimensions: usize) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute_batch(&vec_table_sql(dimensions))?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Get the current schema version from the database.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'schema_version'",
        [],
        |row| {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().unwrap_or(0))
        },
    )
}

/// Get the stored embedding model identifier, if any.
pub fn get_embedding_model(conn: &Connection) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'embedding_model'",
        [],
        |row| row.get::<_, String>(0),
    )
    .optional()
}

/// Record the embedding model the stored vectors were produced with.
pub fn set_embedding_model(conn: &Connection, model: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_meta (key, value) VALUES ('embedding_model', ?1)",
        [model],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Connection {
        crate::db::load_sqlite_vec();
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn schema_creates_all_tables() {
        let conn = fresh();
        init_schema(&conn, 384).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"log_points".to_string()));
        assert!(tables.contains(&"log_vectors".to_string()));
        assert!(tables.contains(&"waitlist".to_string()));
        assert!(tables.contains(&"schema_meta".to_string()));
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = fresh();
        init_schema(&conn, 384).unwrap();
        init_schema(&conn, 384).unwrap();
    }

    #[test]
    fn embedding_model_round_trips() {
        let conn = fresh();
        init_schema(&conn, 4).unwrap();
        assert_eq!(get_embedding_model(&conn).unwrap(), None);
        set_embedding_model(&conn, "all-MiniLM-L6-v2").unwrap();
        assert_eq!(
            get_embedding_model(&conn).unwrap().as_deref(),
            Some("all-MiniLM-L6-v2")
        );
    }
}
