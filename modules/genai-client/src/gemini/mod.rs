mod client;
pub(crate) mod types;

use anyhow::Result;
use async_trait::async_trait;

use crate::TextModel;
use client::GeminiClient;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";

/// Gemini-backed text generation.
#[derive(Clone)]
pub struct Gemini {
    client: GeminiClient,
}

impl Gemini {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: GeminiClient::new(api_key.into(), model.into()),
        }
    }

    /// Override the API base URL (tests point this at a local stub).
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.client = self.client.with_base_url(url);
        self
    }
}

#[async_trait]
impl TextModel for Gemini {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client.generate_content(prompt).await
    }
}
