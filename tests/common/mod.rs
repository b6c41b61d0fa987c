// stub completion services for router and server tests

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream;
use genguard::{Completion, Error, Fragments, ResponseRouter, RuleSet, Turn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PROMPT: &str = "test system prompt";

pub enum Behavior {
    Reply(Vec<&'static str>),
    Refuse,
    BadChunk,
    Hang,
}

pub struct Stub {
    behavior: Behavior,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, Vec<Turn>)>>,
}

impl Stub {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_call(&self) -> Option<(String, Vec<Turn>)> {
        self.seen.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Completion for Stub {
    async fn complete(&self, system_prompt: &str, history: &[Turn]) -> Result<Fragments, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), history.to_vec()));

        match &self.behavior {
            Behavior::Reply(parts) => {
                let parts: Vec<Result<String, Error>> =
                    parts.iter().map(|p| Ok(p.to_string())).collect();
                Ok(Box::pin(stream::iter(parts)))
            }
            Behavior::Refuse => Err(Error::Unavailable("503 Service Unavailable".to_string())),
            Behavior::BadChunk => Ok(Box::pin(stream::iter(vec![
                Ok("Keep it ".to_string()),
                Err(Error::Malformed("bad chunk".to_string())),
            ]))),
            Behavior::Hang => Ok(Box::pin(stream::pending::<Result<String, Error>>())),
        }
    }
}

pub fn router(stub: Arc<Stub>) -> ResponseRouter {
    ResponseRouter::new(Arc::new(RuleSet::default()), stub, PROMPT)
        .with_timeout(Duration::from_millis(200))
}
