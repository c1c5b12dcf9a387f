use chrono::{DateTime, Utc};

use super::{DocumentName, Speaker};

#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub speaker: Speaker,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0} turn has no text")]
pub struct EmptyTurnError(pub Speaker);

impl ChatTurn {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Result<Self, EmptyTurnError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(EmptyTurnError(speaker));
        }

        Ok(Self {
            speaker,
            text,
            created_at: Utc::now(),
        })
    }

    pub fn user(text: impl Into<String>) -> Result<Self, EmptyTurnError> {
        Self::new(Speaker::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Result<Self, EmptyTurnError> {
        Self::new(Speaker::Assistant, text)
    }

    /// Opening assistant notice stored as the first turn of every session.
    pub fn welcome(document_name: &DocumentName) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: format!(
                "File \"{}\" processed! Ask me anything about its content.",
                document_name
            ),
            created_at: Utc::now(),
        }
    }
}
