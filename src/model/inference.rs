//! Hosted seq2seq backend: a Hugging Face style inference endpoint.
//!
//! Request, for `POST {endpoint}/{model_name}`:
//!
//! ```json
//! { "inputs": "...",
//!   "parameters": {
//!     "truncation": "only_first",
//!     "clean_up_tokenization_spaces": true,
//!     "generate_parameters": {
//!       "max_length": 150, "min_length": 30, "length_penalty": 2.0,
//!       "num_beams": 4, "early_stopping": true, "do_sample": false } } }
//! ```
//!
//! Response: `[{"summary_text": "..."}]` on success, `{"error": "..."}`
//! otherwise.

use super::{GenerationParams, ModelError, SummaryModel};
use crate::config::ReportConfig;
use crate::error::ReportError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Summarization served by a remote inference endpoint.
pub struct InferenceModel {
    client: reqwest::Client,
    url: String,
    model_name: String,
    token: Option<String>,
}

impl InferenceModel {
    pub fn new(config: &ReportConfig) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("report-summarizer/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ReportError::ModelNotConfigured {
                backend: "inference".into(),
                hint: e.to_string(),
            })?;

        let token = config
            .api_token
            .clone()
            .or_else(|| std::env::var("HF_TOKEN").ok())
            .filter(|t| !t.is_empty());
        if token.is_none() {
            debug!("No HF_TOKEN set; calling the inference endpoint anonymously");
        }

        Ok(Self {
            client,
            url: format!(
                "{}/{}",
                config.endpoint.trim_end_matches('/'),
                config.model_name
            ),
            model_name: config.model_name.clone(),
            token,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: RequestParameters,
}

#[derive(Debug, Serialize)]
struct RequestParameters {
    truncation: &'static str,
    clean_up_tokenization_spaces: bool,
    generate_parameters: GenerateParameters,
}

#[derive(Debug, Serialize)]
struct GenerateParameters {
    max_length: usize,
    min_length: usize,
    length_penalty: f32,
    num_beams: u32,
    early_stopping: bool,
    do_sample: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Summaries(Vec<SummaryItem>),
    Error { error: String },
}

#[derive(Debug, Deserialize)]
struct SummaryItem {
    #[serde(alias = "generated_text")]
    summary_text: String,
}

fn request_body<'a>(input: &'a str, params: &GenerationParams) -> InferenceRequest<'a> {
    InferenceRequest {
        inputs: input,
        parameters: RequestParameters {
            truncation: "only_first",
            clean_up_tokenization_spaces: true,
            generate_parameters: GenerateParameters {
                max_length: params.max_length,
                min_length: params.min_length,
                length_penalty: params.length_penalty,
                num_beams: params.num_beams,
                early_stopping: params.early_stopping,
                do_sample: false,
            },
        },
    }
}

#[async_trait]
impl SummaryModel for InferenceModel {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn generate(
        &self,
        input: &str,
        params: &GenerationParams,
    ) -> Result<String, ModelError> {
        let mut request = self.client.post(&self.url).json(&request_body(input, params));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ModelError::Transport(format!("POST {}: {}", self.url, e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let parsed = serde_json::from_str::<InferenceResponse>(&body);

        if !status.is_success() {
            let message = match parsed {
                Ok(InferenceResponse::Error { error }) => error,
                _ => body.chars().take(200).collect(),
            };
            warn!("Inference endpoint returned {}: {}", status, message);
            return Err(ModelError::Status {
                status: status.as_u16(),
                message,
            });
        }

        match parsed.map_err(|e| ModelError::Decode(e.to_string()))? {
            InferenceResponse::Summaries(items) => items
                .into_iter()
                .next()
                .map(|item| item.summary_text)
                .filter(|t| !t.trim().is_empty())
                .ok_or(ModelError::EmptyOutput),
            InferenceResponse::Error { error } => Err(ModelError::Backend(error)),
        }
    }
}
