use async_trait::async_trait;

/// Produces an answer to a question from the text of one document.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn answer(&self, document_text: &str, question: &str)
    -> Result<String, AnswerGeneratorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AnswerGeneratorError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("rate limited")]
    RateLimited,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("timed out")]
    TimedOut,
}
