//! Mock infrastructure implementations for tests.
//!
//! Compiled into the library (not behind #[cfg(test)]) so integration tests
//! can wire them into the app.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use super::BaseAI;

/// Scripted BaseAI: returns a canned response, optionally after a delay, or
/// a transport-style error.
#[derive(Clone)]
pub struct MockAI {
    response: Result<String, String>,
    delay: Option<Duration>,
}

impl MockAI {
    /// Always answers with the given text.
    pub fn respond_with(response: impl Into<String>) -> Self {
        Self {
            response: Ok(response.into()),
            delay: None,
        }
    }

    /// Always fails, as an unreachable service would.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            delay: None,
        }
    }

    /// Sleep before answering (for timeout tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl BaseAI for MockAI {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(anyhow::anyhow!("{}", message)),
        }
    }
}
