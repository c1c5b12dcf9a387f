use chrono::{DateTime, Utc};

use super::{ChatTurn, DocumentName, OwnerId, SessionId, Speaker};

/// One extracted document, its owner and the conversation held about it.
#[derive(Debug, Clone)]
pub struct DocumentSession {
    pub id: SessionId,
    pub owner_id: OwnerId,
    pub document_name: DocumentName,
    pub extracted_text: String,
    pub transcript: Vec<ChatTurn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentSession {
    pub fn new(
        owner_id: OwnerId,
        document_name: DocumentName,
        extracted_text: String,
        initial_turn: ChatTurn,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            owner_id,
            document_name,
            extracted_text,
            transcript: vec![initial_turn],
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, owner_id: &OwnerId) -> bool {
        &self.owner_id == owner_id
    }

    pub fn first_assistant_turn(&self) -> Option<&ChatTurn> {
        self.transcript
            .iter()
            .find(|turn| turn.speaker == Speaker::Assistant)
    }
}
