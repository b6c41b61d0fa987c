// core logic - triage rules, the model client, and routing between them

mod ai;
mod classifier;
mod conversation;
pub mod prompt;
mod router;
mod rules;

pub use ai::{AiConfig, Completion, DEFAULT_BASE_URL, DEFAULT_MODEL, Fragments, Groq};
pub use classifier::{Classification, classify};
pub use conversation::{History, Role, Session, Turn};
pub use router::{DEFAULT_TIMEOUT, FALLBACK_MESSAGE, Outcome, Reply, ResponseRouter};
pub use rules::{Category, DangerRule, RuleSet, Severity};
