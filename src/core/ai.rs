// hosted model integration - openai-compatible chat completions over sse

use crate::Error;
use crate::core::conversation::Turn;
use async_trait::async_trait;
use futures::{Stream, StreamExt, future};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio::io::AsyncBufReadExt;
use tokio_stream::wrappers::LinesStream;
use tokio_util::io::StreamReader;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "qwen2-72b-instruct";

/// Reply text as it arrives, one fragment per item.
pub type Fragments = Pin<Box<dyn Stream<Item = Result<String, Error>> + Send>>;

/// Anything that can turn a system prompt plus history into streamed text.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, system_prompt: &str, history: &[Turn]) -> Result<Fragments, Error>;
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl AiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.5,
            max_tokens: 1024,
        }
    }

    // explicit key first, then the usual env var names
    pub fn resolve_key(explicit: Option<String>) -> Result<String, Error> {
        explicit
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("GROQ_API_KEY").ok())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or(Error::MissingApiKey)
    }
}

pub struct Groq {
    client: reqwest::Client,
    config: AiConfig,
}

// what we send
#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

// what comes back, one of these per sse data line
#[derive(Deserialize)]
struct Chunk {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    delta: Delta,
}

#[derive(Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Debug, PartialEq)]
pub(crate) enum SseLine {
    Fragment(String),
    Skip,
    Done,
}

impl Groq {
    pub fn new(config: AiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn request<'a>(&'a self, system_prompt: &'a str, history: &'a [Turn]) -> Request<'a> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message {
            role: "system",
            content: system_prompt,
        });
        messages.extend(history.iter().map(|t| Message {
            role: t.role.as_str(),
            content: &t.content,
        }));

        Request {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: true,
        }
    }
}

#[async_trait]
impl Completion for Groq {
    async fn complete(&self, system_prompt: &str, history: &[Turn]) -> Result<Fragments, Error> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("content-type", "application/json")
            .json(&self.request(system_prompt, history))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Unavailable(format!("{status}: {body}")));
        }

        // bytes -> lines -> fragments, stopping at [DONE]
        let bytes = response
            .bytes_stream()
            .map(|r| r.map_err(std::io::Error::other));
        let lines = LinesStream::new(tokio::io::BufReader::new(StreamReader::new(bytes)).lines());

        let fragments = lines
            .map(|line| match line {
                Ok(line) => parse_sse_line(&line),
                Err(e) => Err(Error::Unavailable(format!("stream read failed: {e}"))),
            })
            .take_while(|parsed| future::ready(!matches!(parsed, Ok(SseLine::Done))))
            .filter_map(|parsed| {
                future::ready(match parsed {
                    Ok(SseLine::Fragment(text)) => Some(Ok(text)),
                    Ok(_) => None,
                    Err(e) => Some(Err(e)),
                })
            });

        Ok(Box::pin(fragments))
    }
}

pub(crate) fn parse_sse_line(line: &str) -> Result<SseLine, Error> {
    // comments, event names, keep-alives, blank separators
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(SseLine::Skip);
    };

    let data = data.trim();
    if data == "[DONE]" {
        return Ok(SseLine::Done);
    }

    let chunk: Chunk = serde_json::from_str(data)?;

    match chunk.choices.into_iter().next().and_then(|c| c.delta.content) {
        Some(text) if !text.is_empty() => Ok(SseLine::Fragment(text)),
        _ => Ok(SseLine::Skip),
    }
}
