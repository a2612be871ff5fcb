use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::prompts::{
    OUTLINE_SYSTEM_PROMPT, REFERENCE_SYSTEM_PROMPT, first_pass_instructions,
    next_pass_instructions, reference_prompt,
};
use super::{ExtractionError, ExtractionService, OutlineRequest, ReferenceRequest};
use crate::model::ReferenceEdge;
use crate::xref::parse_reference_payload;

const INITIAL_BACKOFF: Duration = Duration::from_millis(750);
const MAX_BACKOFF: Duration = Duration::from_millis(5000);
const BACKOFF_FACTOR: f64 = 1.75;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_retries: usize,
    pub timeout: Duration,
}

pub struct OpenAiClient {
    config: LlmConfig,
    http: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            bail!("no API key supplied; pass --api-key or set OPENAI_API_KEY");
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { config, http })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn complete(
        &self,
        messages: Vec<ChatMessage<'_>>,
        json_mode: bool,
    ) -> Result<String, ExtractionError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            response_format: json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let attempts = self.config.max_retries.max(1);
        let mut attempt = 0_usize;
        let mut delay = INITIAL_BACKOFF;

        loop {
            attempt += 1;
            debug!(url = %url, attempt, "sending completion request");

            match self
                .http
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .json(&body)
                .send()
            {
                Ok(response) if response.status().is_success() => {
                    let parsed: ChatResponse = response.json().map_err(ExtractionError::Decode)?;
                    info!(attempt, "completion received");
                    return parsed
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|choice| choice.message.content)
                        .map(|content| content.trim().to_string())
                        .ok_or(ExtractionError::MissingCompletion);
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().unwrap_or_default();
                    if !is_retryable(status) || attempt >= attempts {
                        return Err(ExtractionError::Status {
                            status: status.as_u16(),
                            attempts: attempt,
                            body,
                        });
                    }
                    warn!(status = %status, attempt, "retrying after non-success status");
                }
                Err(err) => {
                    if attempt >= attempts {
                        return Err(ExtractionError::Transport { url, source: err });
                    }
                    warn!(error = %err, attempt, "retrying after transport error");
                }
            }

            thread::sleep(delay);
            delay = next_backoff(delay);
        }
    }
}

impl ExtractionService for OpenAiClient {
    fn expand_outline(&self, request: &OutlineRequest<'_>) -> Result<String, ExtractionError> {
        let instructions = if request.pass_number <= 1 {
            first_pass_instructions()
        } else {
            next_pass_instructions(request.pass_number, request.current_outline)
        };

        self.complete(
            vec![
                ChatMessage {
                    role: "system",
                    content: OUTLINE_SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &instructions,
                },
                ChatMessage {
                    role: "user",
                    content: request.document,
                },
            ],
            false,
        )
    }

    fn extract_references(
        &self,
        request: &ReferenceRequest<'_>,
    ) -> Result<Vec<ReferenceEdge>, ExtractionError> {
        let prompt = reference_prompt(request.outline_markdown, request.tagged_text);
        let content = self.complete(
            vec![
                ChatMessage {
                    role: "system",
                    content: REFERENCE_SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            true,
        )?;

        parse_reference_payload(&content)
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn next_backoff(delay: Duration) -> Duration {
    delay.mul_f64(BACKOFF_FACTOR).min(MAX_BACKOFF)
}
