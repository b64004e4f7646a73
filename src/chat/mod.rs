pub mod endpoint;
pub mod lifecycle;
pub mod prompt;
pub mod transport;

use thiserror::Error;

use crate::language::Language;

pub use endpoint::{ApiVariant, Endpoint};
pub use lifecycle::{CancelToken, RequestLifecycle, Ticket, fetch_explanation, spawn_request};
pub use transport::{ChatTransport, HttpTransport, RawResponse, TransportError};

/// Shown instead of an empty explanation.
pub const NO_RESPONSE: &str = "No response from server";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExplainError {
    #[error("No topic selected")]
    NoTopicSelected,
    #[error("Server {status}: {body}")]
    Server { status: u16, body: String },
    #[error("{0}")]
    Network(String),
    #[error("invalid response: {0}")]
    Parse(String),
}

/// How one explanation request ended. Aborting is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { text: String },
    Aborted,
    Failed(ExplainError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExplanationRequest {
    pub id: u64,
    pub topic: String,
    pub subject: String,
    pub language: Language,
    pub prompt: String,
}

impl ExplanationRequest {
    pub fn new(id: u64, topic: &str, subject: &str, language: Language) -> Self {
        Self {
            id,
            topic: topic.to_string(),
            subject: subject.to_string(),
            language,
            prompt: prompt::build_prompt(topic, subject, language),
        }
    }
}
