pub mod analyzer;
pub mod fallback;
pub mod gateway;
pub mod models;
pub mod prompt;
pub mod providers;

pub use analyzer::TextGenerator;
pub use gateway::{AiGateway, AiReply, FallbackReason, ReplySource};
pub use models::GenerationConfig;
pub use prompt::{AnalysisMode, Prompt, build_prompt, truncate_code};
pub use providers::disabled::DisabledGenerator;
pub use providers::gemini::GeminiProvider;
