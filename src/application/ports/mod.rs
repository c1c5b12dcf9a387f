mod answer_generator;
mod decoder;
mod repository_error;
mod session_repository;

pub use answer_generator::{AnswerGenerator, AnswerGeneratorError};
pub use decoder::{DecodeError, Decoder};
pub use repository_error::RepositoryError;
pub use session_repository::SessionRepository;
