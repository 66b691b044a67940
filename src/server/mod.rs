//! HTTP server initialization.
//!
//! [`build_service`] constructs every collaborator from configuration in one
//! step; [`router`] wires the handlers; [`serve`] binds and runs until Ctrl-C.

pub mod error;
pub mod handlers;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::MemlogConfig;
use crate::db;
use crate::embedding::{self, EmbeddingProvider};
use crate::index;
use crate::llm;
use crate::memory::MemoryService;
use crate::waitlist::SqliteWaitlistStore;

/// Open the database and warn if its vectors came from a different model.
fn open_shared_db(config: &MemlogConfig, dimensions: usize) -> Result<Arc<Mutex<Connection>>> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path, dimensions)?;
    tracing::info!(db = %db_path.display(), "database ready");

    match db::schema::get_embedding_model(&conn)? {
        Some(stored) if stored != config.embedding.model => {
            tracing::warn!(
                stored = %stored,
                configured = %config.embedding.model,
                "embedding model changed; existing vectors are not comparable with new ones"
            );
        }
        Some(_) => {}
        None => db::schema::set_embedding_model(&conn, &config.embedding.model)?,
    }

    Ok(Arc::new(Mutex::new(conn)))
}

/// Build the service with its collaborators created from `config`.
pub async fn build_service(config: &MemlogConfig) -> Result<MemoryService> {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::from(embedding::create_provider(&config.embedding)?);
    let dimensions = embedder.dimensions();
    tracing::info!(dimensions, "embedding provider ready");

    let db = open_shared_db(config, dimensions)?;

    let vector_index = index::create_index(&config.vector_index, Arc::clone(&db))?;
    vector_index
        .ensure_collection(dimensions)
        .await
        .context("failed to prepare vector collection")?;
    tracing::info!(backend = vector_index.backend_name(), "vector index ready");

    let model = Arc::from(llm::create_language_model(&config.llm)?);
    if config.llm.api_key.is_none() {
        tracing::warn!("no GEMINI_API_KEY configured; /chat will fail once memories are found");
    }

    let waitlist = Arc::new(SqliteWaitlistStore::new(db));

    Ok(MemoryService::new(
        embedder,
        vector_index,
        model,
        waitlist,
        config.retrieval.clone(),
    ))
}

/// Route table for the HTTP surface.
pub fn router(service: Arc<MemoryService>) -> Router {
    Router::new()
        .route("/log", post(handlers::log_event))
        .route("/chat", post(handlers::chat))
        .route("/search", get(handlers::search))
        .route("/waitlist", post(handlers::join_waitlist))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        // The browser extension posts from arbitrary page origins.
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Start the HTTP server and block until Ctrl-C.
pub async fn serve(config: MemlogConfig) -> Result<()> {
    let bind_addr = config.bind_addr();
    tracing::info!(addr = %bind_addr, "starting memlog server");

    let service = Arc::new(build_service(&config).await?);
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "listening at http://{bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
