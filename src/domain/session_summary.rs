use chrono::{DateTime, Utc};

use super::{DocumentName, DocumentSession, SessionId};

pub const PREVIEW_PLACEHOLDER: &str = "No answers yet.";

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub id: SessionId,
    pub document_name: DocumentName,
    pub preview: String,
    pub turn_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionSummary {
    pub fn from_session(session: &DocumentSession, preview_chars: usize) -> Self {
        Self {
            id: session.id,
            document_name: session.document_name.clone(),
            preview: preview_text(
                session.first_assistant_turn().map(|turn| turn.text.as_str()),
                preview_chars,
            ),
            turn_count: session.transcript.len(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// Preview shown in session listings, cut to `max_chars` characters.
pub fn preview_text(first_assistant_text: Option<&str>, max_chars: usize) -> String {
    first_assistant_text
        .unwrap_or(PREVIEW_PLACEHOLDER)
        .chars()
        .take(max_chars)
        .collect()
}
