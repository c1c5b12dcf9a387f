#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    #[error("document session not found")]
    NotFound,
    #[error("extracted text is empty")]
    EmptyExtraction,
}
