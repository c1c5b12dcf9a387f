use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::application::ports::{RepositoryError, SessionRepository};
use crate::domain::{ChatTurn, DocumentName, DocumentSession, OwnerId, SessionId, SessionSummary};

/// Process-local session store. Every mutation happens under one write lock,
/// which makes appends atomic without any retry.
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<SessionId, DocumentSession>>,
    preview_chars: usize,
}

impl InMemorySessionRepository {
    pub fn new(preview_chars: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            preview_chars,
        }
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(
        &self,
        owner_id: &OwnerId,
        document_name: &DocumentName,
        extracted_text: &str,
        initial_turn: ChatTurn,
    ) -> Result<SessionId, RepositoryError> {
        if extracted_text.trim().is_empty() {
            return Err(RepositoryError::EmptyExtraction);
        }

        let session = DocumentSession::new(
            owner_id.clone(),
            document_name.clone(),
            extracted_text.to_string(),
            initial_turn,
        );
        let id = session.id;

        self.sessions.write().await.insert(id, session);
        Ok(id)
    }

    async fn get(
        &self,
        owner_id: &OwnerId,
        session_id: SessionId,
    ) -> Result<DocumentSession, RepositoryError> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .filter(|session| session.is_owned_by(owner_id))
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list(&self, owner_id: &OwnerId) -> Result<Vec<SessionSummary>, RepositoryError> {
        let sessions = self.sessions.read().await;

        let mut summaries: Vec<SessionSummary> = sessions
            .values()
            .filter(|session| session.is_owned_by(owner_id))
            .map(|session| SessionSummary::from_session(session, self.preview_chars))
            .collect();

        summaries.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        Ok(summaries)
    }

    async fn append_turns(
        &self,
        owner_id: &OwnerId,
        session_id: SessionId,
        turns: Vec<ChatTurn>,
    ) -> Result<DocumentSession, RepositoryError> {
        let mut sessions = self.sessions.write().await;

        let session = sessions
            .get_mut(&session_id)
            .filter(|session| session.is_owned_by(owner_id))
            .ok_or(RepositoryError::NotFound)?;

        session.transcript.extend(turns);
        session.updated_at = session.updated_at.max(Utc::now());

        Ok(session.clone())
    }

    async fn delete(
        &self,
        owner_id: &OwnerId,
        session_id: SessionId,
    ) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.write().await;

        match sessions.get(&session_id) {
            Some(session) if session.is_owned_by(owner_id) => {
                sessions.remove(&session_id);
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }
}
