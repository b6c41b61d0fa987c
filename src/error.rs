use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, miette::Diagnostic)]
pub enum Error {
    #[error("Completion service unavailable: {0}")]
    Unavailable(String),

    #[error("Completion service sent a malformed response: {0}")]
    Malformed(String),

    #[error("Completion service timed out after {0:?}")]
    Timeout(Duration),

    #[error("Missing API key. Set one of: GROQ_API_KEY or OPENAI_API_KEY")]
    MissingApiKey,

    #[error("Invalid rule table: {0}")]
    Rules(String),

    #[error("Could not read prompt file: {0}")]
    Prompt(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server error: {0}")]
    Server(String),
}

/// Why a completion call failed. All three resolve to the same fallback reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Unavailable,
    Malformed,
    Timeout,
}

impl Error {
    // anything that isn't a timeout or a bad payload counts as "couldn't reach it"
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::Timeout(_) => FailureKind::Timeout,
            Error::Malformed(_) | Error::Json(_) => FailureKind::Malformed,
            Error::Http(e) if e.is_timeout() => FailureKind::Timeout,
            Error::Http(e) if e.is_decode() => FailureKind::Malformed,
            _ => FailureKind::Unavailable,
        }
    }
}
