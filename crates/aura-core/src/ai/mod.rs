pub mod gemini;

pub use gemini::{ApiError, ContentRequest, GeminiClient, ImageRequest, Turn};
