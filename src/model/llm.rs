//! Chat-provider backend via `edgequake-llm`.
//!
//! Any provider the factory knows (OpenAI, Anthropic, Gemini, Ollama, …) can
//! write the summary. Decoding is deterministic (temperature 0.0) and
//! `max_tokens` caps the output at `max_summary_tokens`.

use super::{GenerationParams, ModelError, SummaryModel};
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::prompts::{summary_request, SUMMARY_SYSTEM_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::debug;

const DEFAULT_LLM_MODEL: &str = "gpt-4.1-nano";

/// Summarization through a chat completion provider.
pub struct LlmModel {
    provider: Arc<dyn LLMProvider>,
    label: String,
}

impl LlmModel {
    pub fn new(config: &ReportConfig) -> Result<Self, ReportError> {
        let (provider, label) = resolve_provider(config)?;
        Ok(Self { provider, label })
    }
}

#[async_trait]
impl SummaryModel for LlmModel {
    fn name(&self) -> &str {
        &self.label
    }

    async fn generate(
        &self,
        input: &str,
        params: &GenerationParams,
    ) -> Result<String, ModelError> {
        let messages = vec![
            ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
            ChatMessage::user(summary_request(input, params)),
        ];
        let options = build_options(params);

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| ModelError::Backend(e.to_string()))?;

        debug!(
            "{}: {} input tokens, {} output tokens",
            self.label, response.prompt_tokens, response.completion_tokens
        );

        if response.content.trim().is_empty() {
            return Err(ModelError::EmptyOutput);
        }
        Ok(response.content)
    }
}

fn build_options(params: &GenerationParams) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(0.0),
        max_tokens: Some(params.max_length),
        ..Default::default()
    }
}

type Resolved = (Arc<dyn LLMProvider>, String);

fn create_provider(provider_name: &str, model: &str) -> Result<Resolved, ReportError> {
    let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ReportError::ModelNotConfigured {
            backend: format!("llm:{provider_name}"),
            hint: format!("{e}"),
        }
    })?;
    Ok((provider, format!("{provider_name}/{model}")))
}

/// Resolve the chat provider, from most-specific to least-specific:
///
/// 1. `config.provider`, used as-is
/// 2. `config.provider_name` + `config.llm_model`
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set
/// 4. OpenAI, when `OPENAI_API_KEY` is set
/// 5. whatever `ProviderFactory::from_env` detects
///
/// Also returns the label used in logs and errors.
fn resolve_provider(config: &ReportConfig) -> Result<Resolved, ReportError> {
    if let Some(ref provider) = config.provider {
        let label = config.llm_model.clone().unwrap_or_else(|| "llm:custom".into());
        return Ok((Arc::clone(provider), label));
    }

    let model = config.llm_model.as_deref().unwrap_or(DEFAULT_LLM_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_provider(&prov, &env_model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ReportError::ModelNotConfigured {
            backend: "llm:auto".to_string(),
            hint: format!(
                "No chat provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok((llm_provider, "llm:auto".to_string()))
}
