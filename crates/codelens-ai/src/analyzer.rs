use anyhow::Result;
use async_trait::async_trait;

/// A text-generation backend. Implementations make exactly one upstream
/// call per `generate` and never retry.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider name, used in logs.
    fn provider(&self) -> &str;

    fn model_name(&self) -> &str;

    /// Send `prompt` and return the model's raw text. An empty string means
    /// the upstream answered without content.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
