use async_trait::async_trait;

use crate::domain::{ChatTurn, DocumentName, DocumentSession, OwnerId, SessionId, SessionSummary};

use super::RepositoryError;

/// Durable store of document sessions.
///
/// Every read and write except `create` is scoped by `owner_id`; a session
/// owned by someone else is reported as `NotFound`, exactly like a missing one.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persists a new session whose transcript holds only `initial_turn`.
    /// Fails with `EmptyExtraction` when `extracted_text` has no visible content.
    async fn create(
        &self,
        owner_id: &OwnerId,
        document_name: &DocumentName,
        extracted_text: &str,
        initial_turn: ChatTurn,
    ) -> Result<SessionId, RepositoryError>;

    async fn get(
        &self,
        owner_id: &OwnerId,
        session_id: SessionId,
    ) -> Result<DocumentSession, RepositoryError>;

    /// Sessions of `owner_id`, most recently updated first.
    async fn list(&self, owner_id: &OwnerId) -> Result<Vec<SessionSummary>, RepositoryError>;

    /// Appends `turns` in order as one atomic step and returns the session as
    /// it stood right after the append. Concurrent appends to the same session
    /// are serialized; none of them is lost.
    async fn append_turns(
        &self,
        owner_id: &OwnerId,
        session_id: SessionId,
        turns: Vec<ChatTurn>,
    ) -> Result<DocumentSession, RepositoryError>;

    async fn delete(&self, owner_id: &OwnerId, session_id: SessionId)
    -> Result<(), RepositoryError>;
}
