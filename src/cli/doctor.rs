//! CLI `doctor` command: run database diagnostics and print a health report.

use anyhow::{Context, Result};
use memlog::config::MemlogConfig;
use memlog::db;
use memlog::embedding::EMBEDDING_DIM;

pub fn doctor(config: &MemlogConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `memlog serve` to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let conn = db::open_database(&db_path, EMBEDDING_DIM)
        .context("failed to open database (may be corrupt)")?;
    let report = db::check_database_health(&conn).context("failed to run health check")?;

    println!("memlog Health Report");
    println!("====================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!("sqlite-vec:        {}", report.sqlite_vec_version);
    println!("Vector backend:    {}", config.vector_index.backend);
    println!();
    println!("Embedding model:");
    println!("  Stored:          {}", report.embedding_model.as_deref().unwrap_or("(not set)"));
    println!("  Configured:      {}", config.embedding.model);
    if let Some(ref stored) = report.embedding_model {
        if stored != &config.embedding.model {
            println!("  WARNING: model mismatch! Stored vectors will not match new queries.");
        } else {
            println!("  Status:          OK (match)");
        }
    }
    println!();
    println!("Row counts:");
    if config.vector_index.backend == "sqlite" {
        println!("  Log events:      {}", report.log_count);
    } else {
        println!("  Log events:      (stored in {})", config.vector_index.url);
    }
    println!("  Waitlist:        {}", report.waitlist_count);
    println!();
    println!("Language model:    {} ({})", config.llm.model, key_status(config));
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
    }

    Ok(())
}

fn key_status(config: &MemlogConfig) -> &'static str {
    if config.llm.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
        "API key set"
    } else {
        "no API key"
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
