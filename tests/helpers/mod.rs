#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use memlog::config::RetrievalConfig;
use memlog::db;
use memlog::embedding::{EmbeddingProvider, EMBEDDING_DIM};
use memlog::index::sqlite::SqliteVectorIndex;
use memlog::index::VectorIndex;
use memlog::llm::LanguageModel;
use memlog::memory::types::{EventType, LogItem, WaitlistEntry};
use memlog::memory::MemoryService;
use memlog::waitlist::{InsertOutcome, SqliteWaitlistStore, WaitlistStore};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Open a fresh in-memory database with the schema applied.
pub fn test_db() -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(db::open_memory_database(EMBEDDING_DIM).unwrap()))
}

/// Deterministic bag-of-words embedder. Texts sharing words get similar
/// vectors; identical texts get identical vectors. Records every input.
#[derive(Default)]
pub struct FakeEmbedder {
    pub inputs: Mutex<Vec<String>>,
}

impl FakeEmbedder {
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

impl EmbeddingProvider for FakeEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.inputs.lock().unwrap().push(text.to_string());
        Ok(bag_of_words(text))
    }
}

pub fn bag_of_words(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBEDDING_DIM];
    for word in text.split_whitespace() {
        let bucket = word
            .to_lowercase()
            .bytes()
            .fold(7usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
        v[bucket % EMBEDDING_DIM] += 1.0;
    }
    if v.iter().all(|x| *x == 0.0) {
        v[0] = 1.0;
    }
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    v.iter_mut().for_each(|x| *x /= norm);
    v
}

pub struct FailingEmbedder;

impl EmbeddingProvider for FailingEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        anyhow::bail!("model not loaded")
    }
}

/// Language model that returns a canned reply and keeps the prompts it saw.
pub struct RecordingModel {
    pub reply: String,
    pub prompts: Mutex<Vec<String>>,
}

impl RecordingModel {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LanguageModel for RecordingModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

pub struct FailingModel;

#[async_trait]
impl LanguageModel for FailingModel {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        anyhow::bail!("quota exceeded")
    }
}

pub struct FailingWaitlist;

#[async_trait]
impl WaitlistStore for FailingWaitlist {
    async fn find_by_email(&self, _email: &str) -> Result<Option<WaitlistEntry>> {
        anyhow::bail!("connection refused")
    }

    async fn insert(&self, _entry: &WaitlistEntry) -> Result<InsertOutcome> {
        anyhow::bail!("connection refused")
    }

    async fn count(&self) -> Result<u64> {
        anyhow::bail!("connection refused")
    }
}

/// Store that never sees the email on lookup but hits the unique key on
/// insert, as when a concurrent signup for the same email lands in between.
#[derive(Default)]
pub struct RacingWaitlist {
    pub inserts: Mutex<usize>,
}

#[async_trait]
impl WaitlistStore for RacingWaitlist {
    async fn find_by_email(&self, _email: &str) -> Result<Option<WaitlistEntry>> {
        Ok(None)
    }

    async fn insert(&self, _entry: &WaitlistEntry) -> Result<InsertOutcome> {
        *self.inserts.lock().unwrap() += 1;
        Ok(InsertOutcome::Duplicate)
    }

    async fn count(&self) -> Result<u64> {
        Ok(1)
    }
}

/// A service wired to in-memory SQLite with the fake collaborators, plus
/// handles for inspecting them.
pub struct TestHarness {
    pub service: MemoryService,
    pub embedder: Arc<FakeEmbedder>,
    pub model: Arc<RecordingModel>,
    pub index: Arc<SqliteVectorIndex>,
    pub waitlist: Arc<SqliteWaitlistStore>,
}

pub fn harness() -> TestHarness {
    harness_with(RetrievalConfig::default())
}

pub fn harness_with(retrieval: RetrievalConfig) -> TestHarness {
    let db = test_db();
    let embedder = Arc::new(FakeEmbedder::default());
    let model = Arc::new(RecordingModel::new("You read about Rust ownership."));
    let index = Arc::new(SqliteVectorIndex::new(Arc::clone(&db)));
    let waitlist = Arc::new(SqliteWaitlistStore::new(db));

    let service = MemoryService::new(
        embedder.clone(),
        index.clone(),
        model.clone(),
        waitlist.clone(),
        retrieval,
    );

    TestHarness {
        service,
        embedder,
        model,
        index,
        waitlist,
    }
}

/// Build a service from explicit collaborators on a fresh database.
pub fn service_with(
    embedder: Arc<dyn EmbeddingProvider>,
    model: Arc<dyn LanguageModel>,
    waitlist: Option<Arc<dyn WaitlistStore>>,
) -> MemoryService {
    let db = test_db();
    let index: Arc<dyn VectorIndex> = Arc::new(SqliteVectorIndex::new(Arc::clone(&db)));
    let waitlist = waitlist.unwrap_or_else(|| Arc::new(SqliteWaitlistStore::new(db)));
    MemoryService::new(embedder, index, model, waitlist, RetrievalConfig::default())
}

pub fn visit(url: &str, title: Option<&str>) -> LogItem {
    LogItem {
        event_type: EventType::UrlVisit,
        url: url.to_string(),
        timestamp: "2024-05-01T12:00:00Z".parse().unwrap(),
        text: None,
        title: title.map(str::to_string),
    }
}

pub fn copy(url: &str, text: &str) -> LogItem {
    LogItem {
        event_type: EventType::CopyEvent,
        url: url.to_string(),
        timestamp: "2024-05-01T12:05:00Z".parse().unwrap(),
        text: Some(text.to_string()),
        title: None,
    }
}
