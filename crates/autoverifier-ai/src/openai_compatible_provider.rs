use crate::llm_provider::*;
use crate::retry::retry_with_backoff;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Settings for any server exposing `/chat/completions` and `/models`
/// (Ollama, LM Studio, vLLM, OpenAI itself)
#[derive(Debug, Clone)]
pub struct OpenAICompatibleConfig {
    /// API root including the version segment, e.g. `http://localhost:11434/v1`
    pub base_url: String,
    pub model: String,
    pub context_window: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Sent as a Bearer token when present
    pub api_key: Option<String>,
    /// Name reported by `provider_name()` and used in log and error text
    pub provider_name: String,
}

impl Default for OpenAICompatibleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234/v1".to_string(),
            model: "local-model".to_string(),
            context_window: 32_000,
            timeout_secs: 60,
            max_retries: 3,
            api_key: None,
            provider_name: "openai-compatible".to_string(),
        }
    }
}

impl OpenAICompatibleConfig {
    /// Keyless config for a local server given its root URL (without `/v1`)
    pub fn local_server(name: &str, server_url: &str, model: impl Into<String>) -> Self {
        Self {
            base_url: format!("{}/v1", server_url.trim_end_matches('/')),
            model: model.into(),
            provider_name: name.to_string(),
            ..Default::default()
        }
    }
}

pub struct OpenAICompatibleProvider {
    config: OpenAICompatibleConfig,
    client: Client,
    chat_url: String,
    models_url: String,
}

impl OpenAICompatibleProvider {
    pub fn new(config: OpenAICompatibleConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        let root = config.base_url.trim_end_matches('/');
        let chat_url = format!("{}/chat/completions", root);
        let models_url = format!("{}/models", root);

        Ok(Self {
            config,
            client,
            chat_url,
            models_url,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.api_key.as_deref() {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// JSON body for `/chat/completions`; unset sampling options are omitted
    fn chat_body(&self, messages: &[Message], config: &GenerationConfig) -> Value {
        let mut body = Map::new();
        body.insert("model".into(), json!(self.config.model));
        body.insert(
            "messages".into(),
            messages
                .iter()
                .map(|m| json!({"role": m.role.to_string(), "content": m.content}))
                .collect(),
        );
        body.insert("temperature".into(), json!(config.temperature));

        if let Some(max_tokens) = config.max_tokens {
            body.insert("max_tokens".into(), json!(max_tokens));
        }
        if let Some(top_p) = config.top_p {
            body.insert("top_p".into(), json!(top_p));
        }
        if let Some(stop) = &config.stop {
            body.insert("stop".into(), json!(stop));
        }
        if config.json_output {
            body.insert("response_format".into(), json!({"type": "json_object"}));
        }

        Value::Object(body)
    }

    async fn complete_once(&self, body: &Value) -> Result<CompletionEnvelope> {
        let response = self
            .authorized(self.client.post(&self.chat_url))
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.config.provider_name))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "{} API error ({}): {}",
                self.config.provider_name,
                status,
                detail
            ));
        }

        response.json::<CompletionEnvelope>().await.with_context(|| {
            format!("Failed to parse {} completion", self.config.provider_name)
        })
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    async fn generate_chat(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> LLMResult<LLMResponse> {
        let body = self.chat_body(messages, config);
        let envelope = retry_with_backoff(
            &self.config.provider_name,
            self.config.max_retries,
            || self.complete_once(&body),
        )
        .await?;

        let CompletionEnvelope {
            model,
            choices,
            usage,
        } = envelope;
        let choice = choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No choices in {} response", self.config.provider_name))?;

        Ok(LLMResponse {
            content: choice.message.content.unwrap_or_default(),
            total_tokens: usage.as_ref().and_then(|u| u.total_tokens),
            prompt_tokens: usage.as_ref().and_then(|u| u.prompt_tokens),
            completion_tokens: usage.as_ref().and_then(|u| u.completion_tokens),
            finish_reason: choice.finish_reason,
            model: model.unwrap_or_else(|| self.config.model.clone()),
        })
    }

    async fn is_available(&self) -> bool {
        self.authorized(self.client.get(&self.models_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn provider_name(&self) -> &str {
        &self.config.provider_name
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn characteristics(&self) -> ProviderCharacteristics {
        ProviderCharacteristics {
            max_tokens: self.config.context_window,
            avg_latency_ms: 1500,
            rpm_limit: None,
            supports_json_output: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionEnvelope {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenUsage {
    prompt_tokens: Option<usize>,
    completion_tokens: Option<usize>,
    total_tokens: Option<usize>,
}
