pub mod disabled;
pub mod gemini;
