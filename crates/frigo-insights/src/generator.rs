//! Text generator abstraction.
//!
//! Anything that turns a prompt into text satisfies the contract.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::{InsightError, InsightResult};

/// Prompt in, free text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> InsightResult<String>;
}

/// What a [`MockTextGenerator`] does on each call.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Echo a fixed reply.
    Reply(String),
    Unreachable,
    RateLimited,
    Empty,
}

/// Scripted generator for tests. Records every prompt it receives.
pub struct MockTextGenerator {
    behavior: MockBehavior,
    prompts: Mutex<Vec<String>>,
}

impl MockTextGenerator {
    pub fn new(behavior: MockBehavior) -> Self {
        MockTextGenerator {
            behavior,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(MockBehavior::Reply(text.to_string()))
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, prompt: &str) -> InsightResult<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        match &self.behavior {
            MockBehavior::Reply(text) => Ok(text.clone()),
            MockBehavior::Unreachable => {
                Err(InsightError::RemoteUnreachable("mock offline".to_string()))
            }
            MockBehavior::RateLimited => Err(InsightError::RateLimited),
            MockBehavior::Empty => Err(InsightError::EmptyResponse),
        }
    }
}

/// Generator used when no API key is configured.
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &str) -> InsightResult<String> {
        Err(InsightError::NotConfigured(
            "set GEMINI_API_KEY to enable insights".to_string(),
        ))
    }
}
