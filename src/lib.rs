// genguard library - generator safety chat with keyword triage

pub mod cli;
mod core;
mod error;
mod output;
mod server;

pub use core::{
    AiConfig, Category, Classification, Completion, DEFAULT_BASE_URL, DEFAULT_MODEL,
    DEFAULT_TIMEOUT, DangerRule, FALLBACK_MESSAGE, Fragments, Groq, History, Outcome, Reply,
    ResponseRouter, Role, RuleSet, Session, Severity, Turn, classify, prompt,
};
pub use error::{Error, FailureKind};
pub use server::{Server, app};
