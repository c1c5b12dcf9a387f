mod chat_turn;
mod document_format;
mod document_name;
mod document_session;
mod owner_id;
mod session_id;
mod session_summary;
mod speaker;

pub use chat_turn::{ChatTurn, EmptyTurnError};
pub use document_format::{DocumentFormat, file_extension};
pub use document_name::{DocumentName, InvalidDocumentName};
pub use document_session::DocumentSession;
pub use owner_id::OwnerId;
pub use session_id::SessionId;
pub use session_summary::{PREVIEW_PLACEHOLDER, SessionSummary, preview_text};
pub use speaker::{Speaker, UnknownSpeaker};
