//! Text completion capability used by the summarization reducer

mod openai;

pub use openai::OpenAiCompatClient;

use crate::error::CompletionError;

/// Trait for language model completion
///
/// One call is one attempt from the reducer's point of view; any retry
/// policy lives inside the implementation.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Complete a single prompt
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    /// Get the model name
    fn model_name(&self) -> &str;
}
