// response routing - canned reply on a rule hit, the model otherwise,
// and a fixed fallback whenever the model can't be used

use super::ai::Completion;
use super::classifier::{self, Classification};
use super::conversation::{History, Turn};
use super::rules::{Category, RuleSet};
use crate::Error;
use crate::error::FailureKind;
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const FALLBACK_MESSAGE: &str = "I'm having trouble reaching the assistant right now. \
The most important rules: run your generator outside only, at least 20 feet from doors, \
windows and vents, and keep battery-powered CO detectors working inside. If anyone feels \
dizzy, nauseous or has a headache, get to fresh air and call 911.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Canned { category: Category },
    Completed,
    Fallback { reason: FailureKind },
}

#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub text: String,
    pub outcome: Outcome,
}

/// Decides where each utterance is answered from and records both sides in the history.
pub struct ResponseRouter {
    rules: Arc<RuleSet>,
    completion: Arc<dyn Completion>,
    system_prompt: String,
    timeout: Duration,
}

impl ResponseRouter {
    pub fn new(
        rules: Arc<RuleSet>,
        completion: Arc<dyn Completion>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            rules,
            completion,
            system_prompt: system_prompt.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn classify(&self, utterance: &str) -> Classification {
        classifier::classify(utterance, &self.rules)
    }

    /// Routes one utterance and returns the finished reply.
    pub async fn route(&self, history: &mut History, utterance: &str) -> Reply {
        self.route_with(history, utterance, |_| {}).await
    }

    /// Like [`route`](Self::route), but calls `on_partial` with the reply text
    /// accumulated so far each time the model sends another fragment.
    pub async fn route_with<F>(
        &self,
        history: &mut History,
        utterance: &str,
        mut on_partial: F,
    ) -> Reply
    where
        F: FnMut(&str) + Send,
    {
        history.push(Turn::user(utterance));

        if let Some(rule) = classifier::first_match(utterance, &self.rules) {
            debug!(category = %rule.category, "danger rule matched, sending canned reply");
            history.push(Turn::assistant(rule.response.as_str()));
            return Reply {
                text: rule.response.clone(),
                outcome: Outcome::Canned {
                    category: rule.category,
                },
            };
        }

        debug!(turns = history.len(), "no rule matched, calling completion service");
        let streamed = tokio::time::timeout(self.timeout, self.stream(history, &mut on_partial))
            .await
            .unwrap_or_else(|_| Err(Error::Timeout(self.timeout)));

        let reply = match streamed {
            Ok(text) => Reply {
                text,
                outcome: Outcome::Completed,
            },
            Err(e) => {
                let reason = e.failure_kind();
                warn!(error = %e, ?reason, "completion failed, sending fallback");
                Reply {
                    text: FALLBACK_MESSAGE.to_string(),
                    outcome: Outcome::Fallback { reason },
                }
            }
        };

        history.push(Turn::assistant(reply.text.as_str()));
        reply
    }

    async fn stream<F>(&self, history: &History, on_partial: &mut F) -> Result<String, Error>
    where
        F: FnMut(&str) + Send,
    {
        let mut fragments = self
            .completion
            .complete(&self.system_prompt, history.turns())
            .await?;

        let mut text = String::new();
        while let Some(fragment) = fragments.next().await {
            text.push_str(&fragment?);
            on_partial(&text);
        }

        if text.trim().is_empty() {
            return Err(Error::Malformed("stream ended without any text".to_string()));
        }

        Ok(text)
    }
}
