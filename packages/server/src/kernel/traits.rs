// Trait definitions for dependency injection
//
// Infrastructure traits only - no business logic. What to prompt for (and
// how to parse the answer) lives in domain code.

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait BaseAI: Send + Sync {
    /// Complete a prompt with an LLM (returns raw text response)
    async fn complete(&self, prompt: &str) -> Result<String>;
}
