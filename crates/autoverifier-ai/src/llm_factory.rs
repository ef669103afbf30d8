use crate::gemini_provider::{GeminiConfig, GeminiProvider, DEFAULT_MODEL};
use crate::llm_provider::*;
use anyhow::{anyhow, Result};
use autoverifier_core::LLMConfig;
use std::sync::Arc;

#[cfg(feature = "openai-compatible")]
use crate::openai_compatible_provider::{OpenAICompatibleConfig, OpenAICompatibleProvider};

/// Factory for creating LLM providers based on configuration
pub struct LLMProviderFactory;

impl LLMProviderFactory {
    /// Create an LLM provider from configuration
    pub fn create_from_config(config: &LLMConfig) -> Result<Arc<dyn LLMProvider>> {
        if !config.enabled {
            return Err(anyhow!("LLM is not enabled in configuration"));
        }

        let provider_name = config.provider.to_lowercase();

        match provider_name.as_str() {
            "gemini" | "google" => Self::create_gemini_provider(config),
            #[cfg(feature = "openai-compatible")]
            "ollama" => Self::create_local_provider(config, "ollama", &config.ollama_url),
            #[cfg(feature = "openai-compatible")]
            "lmstudio" => Self::create_local_provider(config, "lmstudio", &config.lmstudio_url),
            #[cfg(feature = "openai-compatible")]
            "openai-compatible" => Self::create_openai_compatible_provider(config),
            _ => Err(anyhow!(
                "Unsupported LLM provider: {}. Available providers: {}",
                provider_name,
                Self::supported_providers().join(", ")
            )),
        }
    }

    /// Create a Google Gemini provider
    fn create_gemini_provider(config: &LLMConfig) -> Result<Arc<dyn LLMProvider>> {
        let api_key = config
            .gemini_api_key
            .clone()
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "Gemini API key not found. Set 'gemini_api_key' in config \
                     or GOOGLE_API_KEY environment variable"
                )
            })?;

        let gemini_config = GeminiConfig {
            api_key,
            base_url: config.gemini_base_url.clone(),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            context_window: config.context_window,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
        };

        Ok(Arc::new(GeminiProvider::new(gemini_config)?))
    }

    /// Create a provider using a local server's OpenAI-compatible endpoint
    #[cfg(feature = "openai-compatible")]
    fn create_local_provider(
        config: &LLMConfig,
        name: &str,
        server_url: &str,
    ) -> Result<Arc<dyn LLMProvider>> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow!("Model name is required for the {} provider", name))?;

        let compat_config = OpenAICompatibleConfig {
            context_window: config.context_window,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
            ..OpenAICompatibleConfig::local_server(name, server_url, model)
        };

        Ok(Arc::new(OpenAICompatibleProvider::new(compat_config)?))
    }

    /// Create an OpenAI-compatible provider
    #[cfg(feature = "openai-compatible")]
    fn create_openai_compatible_provider(config: &LLMConfig) -> Result<Arc<dyn LLMProvider>> {
        let base_url = config.openai_compatible_url.clone().ok_or_else(|| {
            anyhow!("OpenAI-compatible base URL not found. Set 'openai_compatible_url' in config")
        })?;

        let compat_config = OpenAICompatibleConfig {
            base_url,
            model: config
                .model
                .clone()
                .ok_or_else(|| anyhow!("Model name is required for OpenAI-compatible provider"))?,
            context_window: config.context_window,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
            api_key: config.openai_api_key.clone(),
            provider_name: "openai-compatible".to_string(),
        };

        Ok(Arc::new(OpenAICompatibleProvider::new(compat_config)?))
    }

    /// Check if an LLM provider is reachable
    pub async fn check_availability(provider: &Arc<dyn LLMProvider>) -> bool {
        provider.is_available().await
    }

    /// Get a list of supported providers (based on enabled features)
    pub fn supported_providers() -> Vec<&'static str> {
        #[allow(unused_mut)]
        let mut providers = vec!["gemini"];

        #[cfg(feature = "openai-compatible")]
        providers.extend(["ollama", "lmstudio", "openai-compatible"]);

        providers
    }
}
