pub mod anthropic;
pub mod error;
pub mod json;
pub mod openai;
pub mod sentiment;

use crate::config::Settings;
use std::fmt;
use std::sync::Arc;

/// Sampling temperature shared by every sentiment request.
pub const SENTIMENT_TEMPERATURE: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAI,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Anthropic => "anthropic",
            Self::OpenAI => "openai",
        })
    }
}

impl std::str::FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "openai" | "gpt" => Ok(Self::OpenAI),
            other => anyhow::bail!("unknown LLM_PROVIDER {other:?} (expected openai or anthropic)"),
        }
    }
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// Single-turn completion. Returns the model's raw text.
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Picks the provider named by `LLM_PROVIDER`, else whichever key is configured (OpenAI first).
/// `Ok(None)` means no key at all; callers run without a model.
pub fn client_from_settings(settings: &Settings) -> anyhow::Result<Option<Arc<dyn LlmClient>>> {
    let provider = match settings.llm_provider.as_deref() {
        Some(name) => Some(name.parse::<Provider>()?),
        None if settings.openai_api_key.is_some() => Some(Provider::OpenAI),
        None if settings.anthropic_api_key.is_some() => Some(Provider::Anthropic),
        None => None,
    };

    let client: Arc<dyn LlmClient> = match provider {
        Some(Provider::OpenAI) if settings.openai_api_key.is_some() => {
            Arc::new(openai::OpenAiClient::from_settings(settings)?)
        }
        Some(Provider::Anthropic) if settings.anthropic_api_key.is_some() => {
            Arc::new(anthropic::AnthropicClient::from_settings(settings)?)
        }
        Some(provider) => {
            tracing::warn!(%provider, "LLM_PROVIDER set but its API key is missing; sentiment disabled");
            return Ok(None);
        }
        None => return Ok(None),
    };
    tracing::info!(provider = %client.provider(), "language model configured");
    Ok(Some(client))
}
