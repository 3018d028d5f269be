use crate::domain::SentimentResult;
use anyhow::Context;
use serde::Deserialize;

pub fn extract_json(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.starts_with("```") {
        // Remove Markdown fences (```json ... ``` or ``` ... ```).
        let mut inner = trimmed;
        if let Some(after_first) = inner.splitn(2, '\n').nth(1) {
            inner = after_first;
        }
        if let Some(end) = inner.rfind("```") {
            inner = &inner[..end];
        }
        return Some(inner.trim().to_string());
    }

    // Best-effort extraction: first '{' to last '}'.
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(trimmed[start..=end].trim().to_string())
}

#[derive(Debug, Deserialize)]
struct RawSentiment {
    summary: String,
    sentiment_score: f64,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Parses `{summary, sentiment_score, reasoning?}` out of model text. The score is clamped
/// into [-1, 1]; a non-finite score is rejected.
pub fn parse_sentiment(text: &str) -> anyhow::Result<SentimentResult> {
    let json_str = extract_json(text).unwrap_or_else(|| text.trim().to_string());
    let raw = serde_json::from_str::<RawSentiment>(&json_str)
        .with_context(|| format!("LLM output is not valid sentiment JSON: {json_str}"))?;

    anyhow::ensure!(
        raw.sentiment_score.is_finite(),
        "sentiment_score is not a finite number"
    );

    Ok(SentimentResult {
        summary: raw.summary.trim().to_string(),
        sentiment_score: raw.sentiment_score.clamp(-1.0, 1.0),
        reasoning: raw.reasoning.unwrap_or_default(),
    })
}
