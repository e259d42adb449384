use anyhow::{Result, bail};
use async_trait::async_trait;

use crate::analyzer::TextGenerator;

/// Stand-in used when no API key is configured. Every call fails, so the
/// gateway always serves the fallback payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    fn provider(&self) -> &str {
        "disabled"
    }

    fn model_name(&self) -> &str {
        "none"
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        bail!("no AI provider configured")
    }
}
