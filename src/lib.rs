//! Personal memory log backend.
//!
//! A browser extension posts the pages you visit and the text you copy to
//! `memlog`. Each event is embedded with all-MiniLM-L6-v2 (384 dimensions) and
//! stored in a vector index. Later, `/chat` retrieves the closest events and asks
//! a language model to answer a question using only those events as context.
//!
//! # Architecture
//!
//! - **Embeddings**: local ONNX Runtime, behind [`embedding::EmbeddingProvider`]
//! - **Vector index**: sqlite-vec in the local database, or Qdrant over REST,
//!   behind [`index::VectorIndex`]
//! - **Generation**: Gemini `generateContent`, behind [`llm::LanguageModel`]
//! - **Waitlist**: SQLite table keyed by email, behind [`waitlist::WaitlistStore`]
//! - **Transport**: JSON over HTTP via axum
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, and health checks
//! - [`embedding`]: Embedding providers and the field selection rule for log events
//! - [`index`]: Vector index backends
//! - [`llm`]: Language model clients
//! - [`memory`]: Data model, prompt assembly, and the request-level service
//! - [`server`]: HTTP routes and error mapping
//! - [`waitlist`]: Waitlist storage

pub mod config;
pub mod db;
pub mod embedding;
pub mod index;
pub mod llm;
pub mod memory;
pub mod server;
pub mod waitlist;
