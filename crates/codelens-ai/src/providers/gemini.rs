use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::analyzer::TextGenerator;
use crate::models::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part};

pub const DEFAULT_MODEL: &str = "gemini-pro";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini `generateContent` provider.
#[derive(Clone)]
pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
    generation: GenerationConfig,
}

impl GeminiProvider {
    /// `request_timeout` bounds the HTTP exchange itself; callers usually
    /// wrap `generate` in a tighter deadline.
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        request_timeout: Duration,
        generation: GenerationConfig,
    ) -> Result<Self> {
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            client,
            generation,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    fn provider(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let req = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: self.generation,
        };

        tracing::debug!(
            model = %self.model,
            prompt_length = prompt.len(),
            "Calling Gemini API"
        );

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await
            .context("Failed to send request to Gemini API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Gemini API request failed");
            anyhow::bail!("Gemini API error {}: {}", status, body);
        }

        let body: GenerateContentResponse = resp
            .json()
            .await
            .context("Failed to parse Gemini API response")?;

        tracing::debug!(
            usage = ?body.usage_metadata,
            finish_reason = ?body.candidates.first().and_then(|c| c.finish_reason.as_deref()),
            "Gemini API response received"
        );

        Ok(body.text())
    }
}
