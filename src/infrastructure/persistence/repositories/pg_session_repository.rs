use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::application::ports::{RepositoryError, SessionRepository};
use crate::domain::{
    ChatTurn, DocumentName, DocumentSession, OwnerId, SessionId, SessionSummary, Speaker,
    preview_text,
};

const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const UNIQUE_VIOLATION: &str = "23505";

type SessionRow = (Uuid, String, String, String, i32, DateTime<Utc>, DateTime<Utc>);
type TurnRow = (String, String, DateTime<Utc>);
type SummaryRow = (
    Uuid,
    String,
    i32,
    DateTime<Utc>,
    DateTime<Utc>,
    Option<String>,
);

pub struct PgSessionRepository {
    pool: PgPool,
    preview_chars: usize,
    max_append_attempts: u32,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool, preview_chars: usize, max_append_attempts: u32) -> Self {
        Self {
            pool,
            preview_chars,
            max_append_attempts: max_append_attempts.max(1),
        }
    }

    /// One locked read-modify-write of the turn log. `Ok(None)` means the
    /// session is absent or foreign.
    async fn try_append(
        &self,
        owner_id: &OwnerId,
        session_id: SessionId,
        turns: &[ChatTurn],
    ) -> Result<Option<DocumentSession>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<(i32,)> = sqlx::query_as(
            r#"
            SELECT turn_count
            FROM document_sessions
            WHERE id = $1 AND owner_id = $2
            FOR UPDATE
            "#,
        )
        .bind(session_id.as_uuid())
        .bind(owner_id.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some((turn_count,)) = locked else {
            return Ok(None);
        };

        for (offset, turn) in turns.iter().enumerate() {
            insert_turn(&mut tx, session_id, turn_count + offset as i32, turn).await?;
        }

        sqlx::query(
            r#"
            UPDATE document_sessions
            SET turn_count = turn_count + $2,
                updated_at = GREATEST(updated_at, $3)
            WHERE id = $1
            "#,
        )
        .bind(session_id.as_uuid())
        .bind(turns.len() as i32)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let session = load_session(&mut tx, owner_id, session_id).await?;
        tx.commit().await?;

        Ok(session)
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    #[instrument(skip(self, extracted_text, initial_turn), fields(owner_id = %owner_id, document_name = %document_name))]
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

        let mut tx = self.pool.begin().await.map_err(query_failed)?;

        sqlx::query(
            r#"
            INSERT INTO document_sessions
                (id, owner_id, document_name, extracted_text, turn_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(session.id.as_uuid())
        .bind(session.owner_id.as_str())
        .bind(session.document_name.as_str())
        .bind(&session.extracted_text)
        .bind(session.transcript.len() as i32)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(query_failed)?;

        for (seq, turn) in session.transcript.iter().enumerate() {
            insert_turn(&mut tx, session.id, seq as i32, turn)
                .await
                .map_err(query_failed)?;
        }

        tx.commit().await.map_err(query_failed)?;

        Ok(session.id)
    }

    #[instrument(skip(self), fields(owner_id = %owner_id, session_id = %session_id))]
    async fn get(
        &self,
        owner_id: &OwnerId,
        session_id: SessionId,
    ) -> Result<DocumentSession, RepositoryError> {
        let mut conn = self.pool.acquire().await.map_err(query_failed)?;

        load_session(&mut conn, owner_id, session_id)
            .await
            .map_err(query_failed)?
            .ok_or(RepositoryError::NotFound)
    }

    #[instrument(skip(self), fields(owner_id = %owner_id))]
    async fn list(&self, owner_id: &OwnerId) -> Result<Vec<SessionSummary>, RepositoryError> {
        let rows: Vec<SummaryRow> = sqlx::query_as(
            r#"
            SELECT s.id, s.document_name, s.turn_count, s.created_at, s.updated_at,
                   (SELECT t.body
                    FROM session_turns t
                    WHERE t.session_id = s.id AND t.speaker = 'assistant'
                    ORDER BY t.seq
                    LIMIT 1) AS first_answer
            FROM document_sessions s
            WHERE s.owner_id = $1
            ORDER BY s.updated_at DESC, s.created_at DESC
            "#,
        )
        .bind(owner_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(rows
            .into_iter()
            .map(
                |(id, document_name, turn_count, created_at, updated_at, first_answer)| {
                    SessionSummary {
                        id: SessionId::from_uuid(id),
                        document_name: DocumentName::from_stored(document_name),
                        preview: preview_text(first_answer.as_deref(), self.preview_chars),
                        turn_count: turn_count as usize,
                        created_at,
                        updated_at,
                    }
                },
            )
            .collect())
    }

    #[instrument(skip(self, turns), fields(owner_id = %owner_id, session_id = %session_id, turns = turns.len()))]
    async fn append_turns(
        &self,
        owner_id: &OwnerId,
        session_id: SessionId,
        turns: Vec<ChatTurn>,
    ) -> Result<DocumentSession, RepositoryError> {
        let mut attempt = 1;

        loop {
            match self.try_append(owner_id, session_id, &turns).await {
                Ok(Some(session)) => return Ok(session),
                Ok(None) => return Err(RepositoryError::NotFound),
                Err(e) if is_append_conflict(&e) && attempt < self.max_append_attempts => {
                    warn!(
                        error = %e,
                        attempt,
                        max_attempts = self.max_append_attempts,
                        "append conflict, retrying"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(query_failed(e)),
            }
        }
    }

    #[instrument(skip(self), fields(owner_id = %owner_id, session_id = %session_id))]
    async fn delete(
        &self,
        owner_id: &OwnerId,
        session_id: SessionId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM document_sessions
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(session_id.as_uuid())
        .bind(owner_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

async fn insert_turn(
    conn: &mut PgConnection,
    session_id: SessionId,
    seq: i32,
    turn: &ChatTurn,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO session_turns (session_id, seq, speaker, body, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(session_id.as_uuid())
    .bind(seq)
    .bind(turn.speaker.label())
    .bind(&turn.text)
    .bind(turn.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Reads the session row, then exactly `turn_count` turns, so a concurrent
/// append committed in between is never half-visible.
async fn load_session(
    conn: &mut PgConnection,
    owner_id: &OwnerId,
    session_id: SessionId,
) -> Result<Option<DocumentSession>, sqlx::Error> {
    let row: Option<SessionRow> = sqlx::query_as(
        r#"
        SELECT id, owner_id, document_name, extracted_text, turn_count, created_at, updated_at
        FROM document_sessions
        WHERE id = $1 AND owner_id = $2
        "#,
    )
    .bind(session_id.as_uuid())
    .bind(owner_id.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    let Some((id, owner, document_name, extracted_text, turn_count, created_at, updated_at)) = row
    else {
        return Ok(None);
    };

    let turn_rows: Vec<TurnRow> = sqlx::query_as(
        r#"
        SELECT speaker, body, created_at
        FROM session_turns
        WHERE session_id = $1 AND seq < $2
        ORDER BY seq
        "#,
    )
    .bind(id)
    .bind(turn_count)
    .fetch_all(&mut *conn)
    .await?;

    let transcript = turn_rows
        .into_iter()
        .map(|(speaker, text, created_at)| {
            let speaker = speaker
                .parse::<Speaker>()
                .map_err(|e| sqlx::Error::Decode(e.into()))?;
            Ok(ChatTurn {
                speaker,
                text,
                created_at,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

    Ok(Some(DocumentSession {
        id: SessionId::from_uuid(id),
        owner_id: OwnerId::new(owner),
        document_name: DocumentName::from_stored(document_name),
        extracted_text,
        transcript,
        created_at,
        updated_at,
    }))
}

fn is_append_conflict(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => matches!(
            db.code().as_deref(),
            Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED | UNIQUE_VIOLATION)
        ),
        _ => false,
    }
}

fn query_failed(error: sqlx::Error) -> RepositoryError {
    RepositoryError::QueryFailed(error.to_string())
}
