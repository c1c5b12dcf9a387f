use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, instrument, warn};

use crate::application::ports::{
    AnswerGenerator, AnswerGeneratorError, RepositoryError, SessionRepository,
};
use crate::domain::{
    ChatTurn, DocumentFormat, DocumentName, DocumentSession, EmptyTurnError, OwnerId, SessionId,
    SessionSummary,
};
use crate::infrastructure::observability::sanitize_prompt;

use super::extraction_dispatcher::join_attempts;
use super::{DecodeAttempt, ExtractionDispatcher, ExtractionError};

/// Entry point the transport layer calls: extraction followed by persistence,
/// and owner-scoped access to the resulting sessions.
pub struct SessionService {
    dispatcher: Arc<ExtractionDispatcher>,
    repository: Arc<dyn SessionRepository>,
    max_upload_bytes: usize,
}

impl SessionService {
    pub fn new(
        dispatcher: Arc<ExtractionDispatcher>,
        repository: Arc<dyn SessionRepository>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            dispatcher,
            repository,
            max_upload_bytes,
        }
    }

    pub fn dispatcher(&self) -> &ExtractionDispatcher {
        &self.dispatcher
    }

    /// Extracts `content` and opens a session for it. The upload buffer is
    /// owned by this call and released on every return path.
    #[instrument(skip(self, content), fields(owner_id = %owner_id, bytes = content.len()))]
    pub async fn create_session(
        &self,
        owner_id: &OwnerId,
        filename: &str,
        content: Bytes,
    ) -> Result<SessionId, SessionError> {
        if content.len() > self.max_upload_bytes {
            return Err(SessionError::UploadTooLarge {
                size: content.len(),
                limit: self.max_upload_bytes,
            });
        }

        let document_name = DocumentName::parse(filename)
            .map_err(|e| SessionError::InvalidFilename(e.0))?;

        let extracted_text = self
            .dispatcher
            .extract(document_name.as_str(), content)
            .await?;

        if extracted_text.trim().is_empty() {
            return Err(SessionError::EmptyExtraction);
        }

        let welcome = ChatTurn::welcome(&document_name);
        let session_id = self
            .repository
            .create(owner_id, &document_name, &extracted_text, welcome)
            .await?;

        info!(
            session_id = %session_id,
            document_name = %document_name,
            "Document session created"
        );

        Ok(session_id)
    }

    /// Records a question and the answer already produced for it, as one
    /// `user` + `assistant` pair.
    #[instrument(skip(self, question, answer), fields(owner_id = %owner_id, session_id = %session_id))]
    pub async fn append_answered_question(
        &self,
        owner_id: &OwnerId,
        session_id: SessionId,
        question: &str,
        answer: &str,
    ) -> Result<DocumentSession, SessionError> {
        let turns = vec![ChatTurn::user(question)?, ChatTurn::assistant(answer)?];

        let session = self
            .repository
            .append_turns(owner_id, session_id, turns)
            .await?;

        Ok(session)
    }

    /// Answers `question` from the stored document text and records the pair.
    /// When the generator fails nothing is appended.
    #[instrument(skip(self, question, generator), fields(owner_id = %owner_id, session_id = %session_id))]
    pub async fn ask_question(
        &self,
        owner_id: &OwnerId,
        session_id: SessionId,
        question: &str,
        generator: &dyn AnswerGenerator,
    ) -> Result<AnsweredQuestion, SessionError> {
        let question_turn = ChatTurn::user(question)?;
        let session = self.repository.get(owner_id, session_id).await?;

        tracing::debug!(question = %sanitize_prompt(question), "Requesting answer");

        let answer = generator
            .answer(&session.extracted_text, question)
            .await
            .map_err(|e| {
                warn!(error = %e, "Answer generation failed, transcript left unchanged");
                SessionError::AnswerUnavailable(e)
            })?;
        let answer_turn = ChatTurn::assistant(answer.as_str())?;

        let session = self
            .repository
            .append_turns(owner_id, session_id, vec![question_turn, answer_turn])
            .await?;

        Ok(AnsweredQuestion { answer, session })
    }

    pub async fn get_session(
        &self,
        owner_id: &OwnerId,
        session_id: SessionId,
    ) -> Result<DocumentSession, SessionError> {
        Ok(self.repository.get(owner_id, session_id).await?)
    }

    pub async fn list_sessions(&self, owner_id: &OwnerId) -> Result<Vec<SessionSummary>, SessionError> {
        Ok(self.repository.list(owner_id).await?)
    }

    #[instrument(skip(self), fields(owner_id = %owner_id, session_id = %session_id))]
    pub async fn delete_session(
        &self,
        owner_id: &OwnerId,
        session_id: SessionId,
    ) -> Result<(), SessionError> {
        self.repository.delete(owner_id, session_id).await?;
        info!("Document session deleted");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AnsweredQuestion {
    pub answer: String,
    pub session: DocumentSession,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("unsupported format: {}", .extension.as_deref().unwrap_or("<none>"))]
    UnsupportedFormat { extension: Option<String> },
    #[error("{format} decoding failed: {}", join_attempts(.attempts))]
    DecodeFailure {
        format: DocumentFormat,
        attempts: Vec<DecodeAttempt>,
    },
    #[error("extraction interrupted: {0}")]
    ExtractionInterrupted(String),
    #[error("extracted text is empty")]
    EmptyExtraction,
    #[error("document session not found")]
    NotFound,
    #[error("invalid filename: {0:?}")]
    InvalidFilename(String),
    #[error("upload of {size} bytes exceeds the {limit} byte limit")]
    UploadTooLarge { size: usize, limit: usize },
    #[error(transparent)]
    EmptyTurn(#[from] EmptyTurnError),
    #[error("answer unavailable: {0}")]
    AnswerUnavailable(AnswerGeneratorError),
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<ExtractionError> for SessionError {
    fn from(error: ExtractionError) -> Self {
        match error {
            ExtractionError::UnsupportedFormat { extension } => Self::UnsupportedFormat { extension },
            ExtractionError::DecodeFailure { format, attempts } => {
                Self::DecodeFailure { format, attempts }
            }
            other @ (ExtractionError::TimedOut { .. } | ExtractionError::Aborted(_)) => {
                Self::ExtractionInterrupted(other.to_string())
            }
        }
    }
}

impl From<RepositoryError> for SessionError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::EmptyExtraction => Self::EmptyExtraction,
            other @ (RepositoryError::ConnectionFailed(_) | RepositoryError::QueryFailed(_)) => {
                Self::Storage(other.to_string())
            }
        }
    }
}
