use crate::llm::Provider;
use serde_json::Value;
use std::fmt;

/// Model call failure with enough context to debug the provider's answer.
#[derive(Debug, Clone)]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
    pub raw_response_json: Option<Value>,
}

impl LlmDiagnosticsError {
    pub fn http(provider: Provider, status: reqwest::StatusCode, body: String) -> Self {
        Self {
            provider,
            stage: "http",
            detail: format!("status={status}"),
            raw_response_json: serde_json::from_str::<Value>(&body).ok(),
            raw_output: Some(body),
        }
    }

    pub fn empty_response(provider: Provider, raw_response_json: Value) -> Self {
        Self {
            provider,
            stage: "response",
            detail: "no text content in response".to_string(),
            raw_output: None,
            raw_response_json: Some(raw_response_json),
        }
    }
}

impl fmt::Display for LlmDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LLM error (provider={}, stage={}): {}",
            self.provider, self.stage, self.detail
        )
    }
}

impl std::error::Error for LlmDiagnosticsError {}
