use std::env;

use anyhow::{anyhow, Result};
use paperfind_llm::LlmProvider;

#[derive(Debug, Clone)]
pub struct PaperfindConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub throttle_ms: u64,
}

impl PaperfindConfig {
    pub fn from_env() -> Result<Self> {
        let provider_name =
            env::var("PAPERFIND_PROVIDER").unwrap_or_else(|_| "mistral".to_string());
        let provider = LlmProvider::from_str(&provider_name)
            .ok_or_else(|| anyhow!(format!("unknown provider {provider_name}")))?;
        let model =
            env::var("PAPERFIND_MODEL").unwrap_or_else(|_| default_model(provider).to_string());
        let throttle_ms = env::var("PAPERFIND_THROTTLE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_THROTTLE_MS);
        Ok(Self {
            provider,
            model,
            throttle_ms,
        })
    }
}

fn default_model(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::Mistral => "open-mistral-nemo",
        LlmProvider::OpenAi => "gpt-4.1-mini",
        LlmProvider::Local => "local",
    }
}

pub const DEFAULT_THROTTLE_MS: u64 = 250;
