//! The memory service: ingestion, retrieval, chat and waitlist signup.
//!
//! [`MemoryService`] owns one handle to each collaborator and runs every request
//! as a short sequential pipeline: at most one embedding call, one index or store
//! call, and (for chat) one generation call.

use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::embedding::{select_embedding_text, EmbeddingProvider};
use crate::index::VectorIndex;
use crate::llm::LanguageModel;
use crate::memory::prompt::{build_prompt, NO_MEMORIES_RESPONSE};
use crate::memory::types::{LogItem, SearchResult, WaitlistEntry, WaitlistSignup};
use crate::waitlist::{InsertOutcome, WaitlistStore};

pub const LOG_STORED_MESSAGE: &str = "Log stored successfully.";
pub const WAITLIST_JOINED_MESSAGE: &str = "Successfully joined the waitlist!";
pub const WAITLIST_DUPLICATE_MESSAGE: &str = "This email is already on the waitlist.";

/// Failure of a service operation.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Expected business error, shown to the caller as-is.
    #[error("{0}")]
    Conflict(String),
    /// Anything else: validation, embedding, storage, search or generation.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Confirmation {
    pub message: String,
}

impl Confirmation {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub found_memories: usize,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub vector_backend: &'static str,
    pub log_count: u64,
}

pub struct MemoryService {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    llm: Arc<dyn LanguageModel>,
    waitlist: Arc<dyn WaitlistStore>,
    retrieval: RetrievalConfig,
}

impl MemoryService {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn LanguageModel>,
        waitlist: Arc<dyn WaitlistStore>,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            llm,
            waitlist,
            retrieval,
        }
    }

    /// Embed `text` on the blocking pool (ONNX inference is CPU-bound).
    async fn embed(&self, text: String) -> anyhow::Result<Vec<f32>> {
        let embedder = Arc::clone(&self.embedder);
        tokio::task::spawn_blocking(move || embedder.embed(&text))
            .await
            .context("embedding task failed")?
            .context("embedding failed")
    }

    /// Embed one event and store it under a fresh id.
    pub async fn ingest(&self, item: LogItem) -> ServiceResult<Confirmation> {
        let text = select_embedding_text(&item).to_string();
        let vector = self.embed(text).await?;

        let id = uuid::Uuid::new_v4().to_string();
        let payload = item.to_payload().context("failed to serialize log payload")?;
        self.index
            .upsert(&id, vector, payload)
            .await
            .context("failed to store log vector")?;

        tracing::info!(id = %id, event_type = %item.event_type, url = %item.url, "log stored");
        Ok(Confirmation::new(LOG_STORED_MESSAGE))
    }

    /// Nearest stored events for `query`. `limit` defaults to the configured
    /// search limit and is capped at `max_search_limit`; zero yields nothing.
    pub async fn search(&self, query: &str, limit: Option<usize>) -> ServiceResult<Vec<SearchResult>> {
        let limit = limit
            .unwrap_or(self.retrieval.default_search_limit)
            .min(self.retrieval.max_search_limit);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embed(query.to_string()).await?;
        let results = self
            .index
            .search(vector, limit)
            .await
            .context("vector search failed")?;

        tracing::debug!(limit, hits = results.len(), "search complete");
        Ok(results)
    }

    /// Answer `query` from the top matching memories. With no matches the fixed
    /// no-memories reply is returned and the language model is not called.
    pub async fn chat(&self, query: &str) -> ServiceResult<ChatResponse> {
        let vector = self.embed(query.to_string()).await?;
        let results = self
            .index
            .search(vector, self.retrieval.chat_top_k)
            .await
            .context("vector search failed")?;

        if results.is_empty() {
            tracing::info!("chat found no memories");
            return Ok(ChatResponse {
                response: NO_MEMORIES_RESPONSE.to_string(),
                found_memories: 0,
                query: query.to_string(),
            });
        }

        let prompt = build_prompt(query, &results);
        let response = self
            .llm
            .generate(&prompt)
            .await
            .context("language model generation failed")?;

        tracing::info!(found_memories = results.len(), "chat answered");
        Ok(ChatResponse {
            response,
            found_memories: results.len(),
            query: query.to_string(),
        })
    }

    /// Add `signup` to the waitlist, stamping it with the current time.
    pub async fn join_waitlist(&self, signup: WaitlistSignup) -> ServiceResult<Confirmation> {
        let existing = self
            .waitlist
            .find_by_email(&signup.email)
            .await
            .context("waitlist lookup failed")?;
        if existing.is_some() {
            tracing::info!(email = %signup.email, "duplicate waitlist signup");
            return Err(ServiceError::Conflict(WAITLIST_DUPLICATE_MESSAGE.into()));
        }

        let entry = WaitlistEntry::from_signup(signup, chrono::Utc::now());
        match self
            .waitlist
            .insert(&entry)
            .await
            .context("waitlist insert failed")?
        {
            InsertOutcome::Inserted => {
                tracing::info!(email = %entry.email, "joined waitlist");
                Ok(Confirmation::new(WAITLIST_JOINED_MESSAGE))
            }
            // Lost a race with a concurrent signup for the same email.
            InsertOutcome::Duplicate => Err(ServiceError::Conflict(WAITLIST_DUPLICATE_MESSAGE.into())),
        }
    }

    pub async fn health(&self) -> ServiceResult<HealthStatus> {
        let log_count = self.index.count().await.context("failed to count logs")?;
        Ok(HealthStatus {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            vector_backend: self.index.backend_name(),
            log_count,
        })
    }
}
