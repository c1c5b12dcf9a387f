/// Format-specific conversion of raw upload bytes into plain text.
///
/// Implementations are pure: they read `content` and nothing else, and hold
/// no mutable state, so one instance is shared by every request.
pub trait Decoder: Send + Sync {
    /// Short identifier reported in extraction failures.
    fn name(&self) -> &'static str;

    fn decode(&self, content: &[u8]) -> Result<String, DecodeError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed input: {0}")]
    Malformed(String),
    #[error("missing part: {0}")]
    MissingPart(String),
    #[error("unrecognized encoding: {0}")]
    UnrecognizedEncoding(String),
    #[error("unsupported content: {0}")]
    Unsupported(String),
}
