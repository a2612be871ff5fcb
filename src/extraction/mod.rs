mod openai;
mod prompts;

use thiserror::Error;

use crate::model::ReferenceEdge;

pub use openai::{LlmConfig, OpenAiClient};

#[derive(Debug, Clone, Copy)]
pub struct OutlineRequest<'a> {
    pub pass_number: usize,
    pub current_outline: &'a str,
    pub document: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct ReferenceRequest<'a> {
    pub outline_markdown: &'a str,
    pub tagged_text: &'a str,
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("extraction service returned HTTP {status} after {attempts} attempt(s): {body}")]
    Status {
        status: u16,
        attempts: usize,
        body: String,
    },
    #[error("failed to decode extraction service response")]
    Decode(#[source] reqwest::Error),
    #[error("extraction service response carries no completion")]
    MissingCompletion,
    #[error("reference payload is not a {{\"refs\": [...]}} object")]
    MalformedPayload(#[source] serde_json::Error),
}

pub trait ExtractionService {
    fn expand_outline(&self, request: &OutlineRequest<'_>) -> Result<String, ExtractionError>;

    fn extract_references(
        &self,
        request: &ReferenceRequest<'_>,
    ) -> Result<Vec<ReferenceEdge>, ExtractionError>;
}
