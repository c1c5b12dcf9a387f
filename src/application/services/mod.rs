mod decoder_set;
mod extraction_dispatcher;
mod grounded_prompt;
mod session_service;

pub use decoder_set::{DecoderChain, DecoderSet};
pub use extraction_dispatcher::{DecodeAttempt, ExtractionDispatcher, ExtractionError};
pub use grounded_prompt::{GroundedPrompt, NOT_FOUND_REPLY, build_grounded_prompt};
pub use session_service::{AnsweredQuestion, SessionError, SessionService};
