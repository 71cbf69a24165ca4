//! Provider selection from configuration.

use std::sync::Arc;
use oscopilot_config::AppConfig;
use oscopilot_core::error::ProviderError;
use oscopilot_core::provider::Provider;
use crate::openai_compat::OpenAiCompatProvider;

/// Build the configured default provider.
///
/// Hosted backends need an API key; local servers (ollama, vllm, llama.cpp)
/// are accepted without one.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let name = config.default_provider.as_str();
    let entry = config.providers.get(name);

    let base_url = entry
        .and_then(|p| p.api_url.clone())
        .or_else(|| default_base_url(name))
        .ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "provider '{name}' has no api_url and no known default"
            ))
        })?;

    let api_key = match config.provider_api_key() {
        Some(key) => key.to_string(),
        None if is_local(name) => String::new(),
        None => {
            return Err(ProviderError::NotConfigured(format!(
                "no API key for provider '{name}'; set OSCOPILOT_API_KEY or OPENAI_API_KEY"
            )));
        }
    };

    tracing::debug!(provider = name, base_url = %base_url, "Building provider");
    Ok(Arc::new(OpenAiCompatProvider::new(name, base_url, api_key)))
}

/// The model to request: provider entry override first, then the global default.
pub fn resolve_model(config: &AppConfig) -> String {
    config
        .providers
        .get(&config.default_provider)
        .and_then(|p| p.default_model.clone())
        .unwrap_or_else(|| config.default_model.clone())
}

fn is_local(provider_name: &str) -> bool {
    matches!(provider_name, "ollama" | "vllm" | "llamacpp" | "llama.cpp")
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> Option<String> {
    let url = match provider_name {
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "moonshot" => "https://api.moonshot.cn/v1",
        "ollama" => "http://localhost:11434/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        _ => return None,
    };
    Some(url.to_string())
}
