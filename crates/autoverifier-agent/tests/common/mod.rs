#![allow(dead_code)]

use async_trait::async_trait;
use autoverifier_ai::{
    GenerationConfig, LLMProvider, LLMResponse, LLMResult, Message, ProviderCharacteristics,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Provider that answers from a queue and records every prompt it receives
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
    json_requests: Mutex<Vec<bool>>,
}

impl ScriptedProvider {
    pub fn new(responses: impl IntoIterator<Item = Result<String, String>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            ..Default::default()
        })
    }

    pub fn replying(responses: &[&str]) -> Arc<Self> {
        Self::new(responses.iter().map(|r| Ok(r.to_string())))
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn json_requests(&self) -> Vec<bool> {
        self.json_requests.lock().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn generate_chat(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> LLMResult<LLMResponse> {
        let prompt = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().push(prompt);
        self.json_requests.lock().push(config.json_output);

        let next = self
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err("no scripted response left".to_string()));

        match next {
            Ok(content) => Ok(LLMResponse {
                content,
                total_tokens: None,
                prompt_tokens: None,
                completion_tokens: None,
                finish_reason: Some("stop".to_string()),
                model: "scripted".to_string(),
            }),
            Err(message) => Err(anyhow::anyhow!(message)),
        }
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    fn characteristics(&self) -> ProviderCharacteristics {
        ProviderCharacteristics {
            max_tokens: 8192,
            avg_latency_ms: 0,
            rpm_limit: None,
            supports_json_output: true,
        }
    }
}

/// Provider whose answer is computed from the prompt, independent of call order
pub struct RuleProvider<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    rule: F,
}

impl<F> RuleProvider<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    pub fn new(rule: F) -> Arc<Self> {
        Arc::new(Self { rule })
    }
}

#[async_trait]
impl<F> LLMProvider for RuleProvider<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    async fn generate_chat(
        &self,
        messages: &[Message],
        _config: &GenerationConfig,
    ) -> LLMResult<LLMResponse> {
        let prompt = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        tokio::task::yield_now().await;

        Ok(LLMResponse {
            content: (self.rule)(&prompt),
            total_tokens: None,
            prompt_tokens: None,
            completion_tokens: None,
            finish_reason: None,
            model: "rule".to_string(),
        })
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn provider_name(&self) -> &str {
        "rule"
    }

    fn model_name(&self) -> &str {
        "rule"
    }

    fn characteristics(&self) -> ProviderCharacteristics {
        ProviderCharacteristics {
            max_tokens: 8192,
            avg_latency_ms: 0,
            rpm_limit: None,
            supports_json_output: true,
        }
    }
}
