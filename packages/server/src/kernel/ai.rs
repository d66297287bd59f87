// AI implementation using OpenAI
//
// This is the infrastructure implementation of BaseAI. Business logic (what
// to prompt for) lives in domain layers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rig::completion::Prompt;
use rig::providers::openai;

use super::BaseAI;

/// OpenAI implementation of AI capabilities
#[derive(Clone)]
pub struct OpenAIClient {
    client: openai::Client,
}

impl OpenAIClient {
    pub fn new(api_key: String) -> Self {
        let client = openai::Client::new(&api_key);
        Self { client }
    }
}

#[async_trait]
impl BaseAI for OpenAIClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        tracing::debug!(prompt_length = prompt.len(), "Calling OpenAI API");

        let agent = self
            .client
            .agent(openai::GPT_4O)
            .preamble("You are a helpful assistant.")
            .max_tokens(1024)
            .build();

        agent
            .prompt(prompt)
            .await
            .context("OpenAI completion failed")
    }
}
