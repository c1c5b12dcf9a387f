use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{info, instrument, warn};

use crate::application::ports::DecodeError;
use crate::domain::{DocumentFormat, file_extension};

use super::DecoderSet;

/// Routes an upload to the decoder chain of its declared format.
///
/// The format comes from the filename extension alone. The dispatcher keeps
/// no state between calls and may be shared freely across requests.
pub struct ExtractionDispatcher {
    decoders: Arc<DecoderSet>,
    timeout: Duration,
}

impl ExtractionDispatcher {
    pub fn new(decoders: DecoderSet, timeout: Duration) -> Self {
        Self {
            decoders: Arc::new(decoders),
            timeout,
        }
    }

    /// Runs the decoder chain on the blocking pool, bounded by the configured timeout.
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub async fn extract(&self, filename: &str, content: Bytes) -> Result<String, ExtractionError> {
        let format = resolve_format(filename)?;
        let decoders = Arc::clone(&self.decoders);

        let text = tokio::time::timeout(
            self.timeout,
            tokio::task::spawn_blocking(move || run_chain(&decoders, format, &content)),
        )
        .await
        .map_err(|_| ExtractionError::TimedOut {
            format,
            timeout: self.timeout,
        })?
        .map_err(|e| ExtractionError::Aborted(e.to_string()))??;

        info!(%format, chars = text.chars().count(), "Text extraction complete");
        Ok(text)
    }

    /// Same contract as [`extract`](Self::extract) on the calling thread, without a timeout.
    pub fn extract_blocking(&self, filename: &str, content: &[u8]) -> Result<String, ExtractionError> {
        let format = resolve_format(filename)?;
        run_chain(&self.decoders, format, content)
    }
}

fn resolve_format(filename: &str) -> Result<DocumentFormat, ExtractionError> {
    DocumentFormat::from_filename(filename).ok_or_else(|| ExtractionError::UnsupportedFormat {
        extension: file_extension(filename).map(str::to_ascii_lowercase),
    })
}

fn run_chain(
    decoders: &DecoderSet,
    format: DocumentFormat,
    content: &[u8],
) -> Result<String, ExtractionError> {
    let mut attempts = Vec::new();

    for decoder in decoders.chain_for(format) {
        match decoder.decode(content) {
            Ok(text) => {
                if !attempts.is_empty() {
                    info!(%format, decoder = decoder.name(), "Fallback decoder succeeded");
                }
                return Ok(text);
            }
            Err(cause) => {
                warn!(%format, decoder = decoder.name(), error = %cause, "Decoder failed");
                attempts.push(DecodeAttempt {
                    decoder: decoder.name(),
                    cause,
                });
            }
        }
    }

    Err(ExtractionError::DecodeFailure { format, attempts })
}

/// One failed decoder run within a fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeAttempt {
    pub decoder: &'static str,
    pub cause: DecodeError,
}

impl fmt::Display for DecodeAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.decoder, self.cause)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("unsupported format: {}", .extension.as_deref().unwrap_or("<none>"))]
    UnsupportedFormat { extension: Option<String> },
    #[error("{format} decoding failed: {}", join_attempts(.attempts))]
    DecodeFailure {
        format: DocumentFormat,
        attempts: Vec<DecodeAttempt>,
    },
    #[error("{format} extraction timed out after {}s", .timeout.as_secs())]
    TimedOut {
        format: DocumentFormat,
        timeout: Duration,
    },
    #[error("extraction task aborted: {0}")]
    Aborted(String),
}

pub(super) fn join_attempts(attempts: &[DecodeAttempt]) -> String {
    if attempts.is_empty() {
        return "no decoder configured".to_string();
    }

    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; then ")
}
