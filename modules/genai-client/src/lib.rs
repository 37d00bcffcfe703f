pub mod gemini;
pub mod util;

pub use gemini::Gemini;

use anyhow::Result;
use async_trait::async_trait;

/// The single capability the engine needs from a text-generation provider.
/// Everything prompt-shaped lives on the caller's side of this boundary.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
