use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::analyzer::TextGenerator;
use crate::fallback::fallback_payload;
use crate::prompt::{AnalysisMode, Prompt};
use crate::providers::disabled::DisabledGenerator;

/// Why a live reply was replaced by the fallback payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    Timeout,
    Transport,
    Empty,
    InvalidJson,
}

impl FallbackReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Transport => "transport",
            Self::Empty => "empty",
            Self::InvalidJson => "invalid_json",
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Live,
    Fallback(FallbackReason),
}

/// Gateway answer. `text` always parses as a JSON object.
#[derive(Debug, Clone)]
pub struct AiReply {
    pub text: String,
    pub source: ReplySource,
}

impl AiReply {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, ReplySource::Fallback(_))
    }
}

/// Wraps a `TextGenerator` with a deadline and output validation. Failures
/// never reach the caller; they turn into the mode's fallback payload.
#[derive(Clone)]
pub struct AiGateway {
    generator: Arc<dyn TextGenerator>,
}

impl AiGateway {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Gateway that always serves fallbacks.
    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledGenerator))
    }

    pub fn provider(&self) -> &str {
        self.generator.provider()
    }

    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }

    /// Run `prompt` with its mode's default deadline.
    pub async fn analyze(&self, prompt: &Prompt) -> AiReply {
        self.analyze_within(prompt, prompt.mode.timeout()).await
    }

    pub async fn analyze_within(&self, prompt: &Prompt, timeout: Duration) -> AiReply {
        let outcome = match tokio::time::timeout(timeout, self.generator.generate(&prompt.text)).await {
            Err(_) => Err(FallbackReason::Timeout),
            Ok(Err(e)) => {
                debug!(provider = self.provider(), error = %e, "AI call failed");
                Err(FallbackReason::Transport)
            }
            Ok(Ok(raw)) => normalize_reply(&raw, prompt.mode),
        };

        match outcome {
            Ok(text) => AiReply {
                text,
                source: ReplySource::Live,
            },
            Err(reason) => {
                warn!(
                    provider = self.provider(),
                    mode = prompt.mode.as_str(),
                    reason = %reason,
                    "AI reply replaced by fallback payload"
                );
                AiReply {
                    text: fallback_payload(prompt.mode, &prompt.language),
                    source: ReplySource::Fallback(reason),
                }
            }
        }
    }
}

/// Accept a model reply only if it is a JSON object carrying the mode's
/// required keys. Markdown code fences and chatter around the object are
/// stripped; the returned text is the object exactly as the model wrote it.
pub fn normalize_reply(raw: &str, mode: AnalysisMode) -> Result<String, FallbackReason> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FallbackReason::Empty);
    }

    let candidate = strip_code_fence(trimmed);
    let candidate = match (candidate.find('{'), candidate.rfind('}')) {
        (Some(start), Some(end)) if start < end => &candidate[start..=end],
        _ => return Err(FallbackReason::InvalidJson),
    };

    let value: Value = serde_json::from_str(candidate).map_err(|_| FallbackReason::InvalidJson)?;
    let object = value.as_object().ok_or(FallbackReason::InvalidJson)?;
    if mode.required_keys().iter().any(|key| !object.contains_key(*key)) {
        return Err(FallbackReason::InvalidJson);
    }

    Ok(candidate.to_string())
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening line.
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;

    use crate::prompt::build_prompt;

    struct Canned(&'static str);

    #[async_trait]
    impl TextGenerator for Canned {
        fn provider(&self) -> &str {
            "canned"
        }
        fn model_name(&self) -> &str {
            "canned-1"
        }
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    #[async_trait]
    impl TextGenerator for Failing {
        fn provider(&self) -> &str {
            "failing"
        }
        fn model_name(&self) -> &str {
            "failing-1"
        }
        async fn generate(&self, _prompt: &str) -> Result<String> {
            anyhow::bail!("connection refused")
        }
    }

    struct Slow;

    #[async_trait]
    impl TextGenerator for Slow {
        fn provider(&self) -> &str {
            "slow"
        }
        fn model_name(&self) -> &str {
            "slow-1"
        }
        async fn generate(&self, _prompt: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(r#"{"issue_explanation": "late", "fixed_code": ""}"#.to_string())
        }
    }

    fn quick_prompt() -> Prompt {
        build_prompt("x = ", "python", Some("SyntaxError"), AnalysisMode::Quick)
    }

    fn full_prompt() -> Prompt {
        build_prompt("x = 1", "python", None, AnalysisMode::Full)
    }

    #[tokio::test]
    async fn live_reply_is_passed_through() {
        let body = r#"{"issue_explanation": "missing value", "fixed_code": "x = 1"}"#;
        let gateway = AiGateway::new(Arc::new(Canned(body)));
        let reply = gateway.analyze(&quick_prompt()).await;
        assert_eq!(reply.source, ReplySource::Live);
        assert_eq!(reply.text, body);
    }

    #[tokio::test]
    async fn fenced_reply_is_unwrapped() {
        let gateway = AiGateway::new(Arc::new(Canned(
            "```json\n{\"issue_explanation\": \"a\", \"fixed_code\": \"b\"}\n```",
        )));
        let reply = gateway.analyze(&quick_prompt()).await;
        assert_eq!(reply.source, ReplySource::Live);
        assert_eq!(reply.text, "{\"issue_explanation\": \"a\", \"fixed_code\": \"b\"}");
    }

    #[tokio::test]
    async fn transport_error_falls_back() {
        let gateway = AiGateway::new(Arc::new(Failing));
        let reply = gateway.analyze(&full_prompt()).await;
        assert_eq!(reply.source, ReplySource::Fallback(FallbackReason::Transport));
        assert_eq!(reply.text, fallback_payload(AnalysisMode::Full, "python"));
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let gateway = AiGateway::new(Arc::new(Slow));
        let reply = gateway
            .analyze_within(&quick_prompt(), Duration::from_millis(50))
            .await;
        assert_eq!(reply.source, ReplySource::Fallback(FallbackReason::Timeout));
        let value: Value = serde_json::from_str(&reply.text).unwrap();
        assert_eq!(value["issue_explanation"], "Unable to analyze due to timeout");
    }

    #[tokio::test]
    async fn empty_reply_falls_back() {
        let gateway = AiGateway::new(Arc::new(Canned("  \n")));
        let reply = gateway.analyze(&quick_prompt()).await;
        assert_eq!(reply.source, ReplySource::Fallback(FallbackReason::Empty));
    }

    #[tokio::test]
    async fn prose_reply_falls_back() {
        let gateway = AiGateway::new(Arc::new(Canned("Your code looks fine to me!")));
        let reply = gateway.analyze(&full_prompt()).await;
        assert_eq!(reply.source, ReplySource::Fallback(FallbackReason::InvalidJson));
        assert!(reply.is_fallback());
    }

    #[tokio::test]
    async fn disabled_gateway_always_falls_back() {
        let gateway = AiGateway::disabled();
        assert_eq!(gateway.provider(), "disabled");
        let reply = gateway.analyze(&full_prompt()).await;
        assert_eq!(reply.source, ReplySource::Fallback(FallbackReason::Transport));
    }

    #[test]
    fn reply_missing_required_sections_is_rejected() {
        let partial = r#"{"error_detection": {}, "summary": {}}"#;
        assert_eq!(
            normalize_reply(partial, AnalysisMode::Full),
            Err(FallbackReason::InvalidJson)
        );
    }

    #[test]
    fn truncated_json_is_rejected() {
        let cut = r#"{"issue_explanation": "x", "fixed_code": "y"#;
        assert_eq!(
            normalize_reply(cut, AnalysisMode::Quick),
            Err(FallbackReason::InvalidJson)
        );
    }

    #[test]
    fn leading_chatter_is_dropped() {
        let raw = "Here you go:\n{\"issue_explanation\": \"x\", \"fixed_code\": \"y\"}\nGood luck.";
        assert_eq!(
            normalize_reply(raw, AnalysisMode::Quick).unwrap(),
            "{\"issue_explanation\": \"x\", \"fixed_code\": \"y\"}"
        );
    }

    #[test]
    fn json_array_is_rejected() {
        assert_eq!(
            normalize_reply("[1, 2]", AnalysisMode::Quick),
            Err(FallbackReason::InvalidJson)
        );
    }
}
