//! Text-insight collaborator
//!
//! Sends a passage to an OpenAI-compatible chat-completions endpoint and
//! returns the model's answer. Failures never surface as errors: the caller
//! gets a readable `"Request failed: ..."` or `"Processing failed: ..."`
//! string to show in place of the answer.

use crate::error::InsightError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for the insight endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl InsightConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Read `LECTERN_INSIGHT_API_KEY`, `LECTERN_INSIGHT_BASE_URL` and
    /// `LECTERN_INSIGHT_MODEL`, then validate
    pub fn from_env() -> Result<Self, InsightError> {
        let api_key = std::env::var("LECTERN_INSIGHT_API_KEY").unwrap_or_default();
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("LECTERN_INSIGHT_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(model) = std::env::var("LECTERN_INSIGHT_MODEL") {
            config.model = model;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), InsightError> {
        if self.api_key.trim().is_empty() {
            return Err(InsightError::MissingConfig("api_key"));
        }
        if self.base_url.trim().is_empty() {
            return Err(InsightError::MissingConfig("base_url"));
        }
        if self.model.trim().is_empty() {
            return Err(InsightError::MissingConfig("model"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Client for the explain/discuss requests
#[derive(Debug, Clone)]
pub struct InsightClient {
    config: InsightConfig,
    http: reqwest::Client,
}

impl InsightClient {
    pub fn new(config: InsightConfig) -> Result<Self, InsightError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| InsightError::Client(e.to_string()))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    /// Short explanation of a term, person, event, place or claim
    pub async fn explain(&self, text: &str, context: &str) -> String {
        self.complete(&explain_prompt(text, context)).await
    }

    /// Longer analytical discussion of a passage
    pub async fn discuss(&self, text: &str, context: &str) -> String {
        self.complete(&discuss_prompt(text, context)).await
    }

    async fn complete(&self, prompt: &str) -> String {
        let body = json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.7,
        });

        debug!(model = %self.config.model, "Sending insight request");
        let response = self
            .http
            .post(self.config.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status());

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Insight request failed");
                return format!("Request failed: {}", e);
            }
        };

        let payload = match response.json::<Value>().await {
            Ok(payload) => payload,
            Err(e) => return format!("Processing failed: {}", e),
        };

        match message_content(&payload) {
            Some(content) => content.to_string(),
            None => "Processing failed: response has no message content".to_string(),
        }
    }
}

/// `choices[0].message.content` of a chat-completions response
fn message_content(payload: &Value) -> Option<&str> {
    payload
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}

fn context_block(context: &str) -> String {
    let context = context.trim();
    if context.is_empty() {
        String::new()
    } else {
        format!("\n\nSurrounding text, for reference:\n\n{}", context)
    }
}

fn explain_prompt(text: &str, context: &str) -> String {
    format!(
        "Help me understand the following:\n\n{}{}\n\n\
         Answer according to what it is:\n\
         - A term or concept: give a clear definition and explanation.\n\
         - A person: who they are, their background and why they matter.\n\
         - A historical event: what happened, when, and its consequences.\n\
         - A place: where it is, what it is like, and relevant background.\n\
         - A factual claim or figure: check its accuracy and give sources or background.\n\n\
         Be brief and focused. Point out anything wrong or disputed. If the passage \
         is incomplete or cannot be judged, say what further context is needed.",
        text,
        context_block(context)
    )
}

fn discuss_prompt(text: &str, context: &str) -> String {
    format!(
        "Give an in-depth, academic discussion of the following passage:\n\n{}{}\n\n\
         Cover:\n\
         1. Core argument: the author's main point, how it is structured and argued.\n\
         2. Scholarly perspective: relevant fields, theories, schools or thinkers.\n\
         3. Critical reading: gaps in the reasoning, hidden assumptions, likely objections.\n\
         4. Open questions: what deserves further thought and how the ideas apply elsewhere today.\n\n\
         Stay rigorous without being obscure, and briefly explain any technical terms.",
        text,
        context_block(context)
    )
}
