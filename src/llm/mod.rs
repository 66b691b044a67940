//! Language-model seam used by chat.

pub mod gemini;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::LlmConfig;

/// Text generation from a single prompt.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Build the configured language model. Only `"gemini"` is supported.
pub fn create_language_model(config: &LlmConfig) -> Result<Box<dyn LanguageModel>> {
    match config.provider.as_str() {
        "gemini" => Ok(Box::new(gemini::GeminiClient::new(config)?)),
        other => anyhow::bail!("unknown language model provider: {other}. Supported: gemini"),
    }
}
