use crate::config::Settings;
use crate::domain::{FundamentalsSnapshot, InsiderSummary, SentimentResult, Ticker};
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{client_from_settings, json, LlmClient};
use std::sync::Arc;

pub const NO_KEY_NEWS_SUMMARY: &str =
    "No language-model key provided; skipping AI news analysis.";
pub const FAILED_NEWS_SUMMARY: &str = "AI analysis failed; using neutral score.";
pub const NO_INSIDER_ACTIVITY_SUMMARY: &str = "No significant insider activity";

/// News and insider sentiment on top of an optional language model. Every path returns a
/// `SentimentResult`; without a model or on failure the score is neutral.
#[derive(Clone, Default)]
pub struct SentimentAnalyzer {
    client: Option<Arc<dyn LlmClient>>,
}

impl SentimentAnalyzer {
    pub fn new(client: Option<Arc<dyn LlmClient>>) -> Self {
        Self { client }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let client = client_from_settings(settings)?;
        if client.is_none() {
            tracing::warn!("no language-model key configured; sentiment will be neutral");
        }
        Ok(Self::new(client))
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub async fn analyze_news(
        &self,
        ticker: &Ticker,
        headlines: &[String],
        fundamentals: &FundamentalsSnapshot,
    ) -> SentimentResult {
        let Some(client) = self.client.as_deref() else {
            return SentimentResult::neutral(NO_KEY_NEWS_SUMMARY);
        };

        let prompt = news_prompt(ticker, headlines, fundamentals);
        match complete_sentiment(client, &prompt).await {
            Ok(result) => result,
            Err(err) => {
                log_failure(ticker, "news", &err);
                SentimentResult::neutral(FAILED_NEWS_SUMMARY)
            }
        }
    }

    /// Only calls the model when the summary has notable trades.
    pub async fn analyze_insider(&self, summary: &InsiderSummary) -> SentimentResult {
        if !summary.has_notable() {
            return SentimentResult::neutral(NO_INSIDER_ACTIVITY_SUMMARY);
        }

        let Some(client) = self.client.as_deref() else {
            return insider_fallback(summary);
        };

        let prompt = insider_prompt(&summary.ticker, &summary.notable);
        match complete_sentiment(client, &prompt).await {
            Ok(result) => result,
            Err(err) => {
                log_failure(&summary.ticker, "insider", &err);
                insider_fallback(summary)
            }
        }
    }
}

/// Neutral insider result for when no model answer is available.
pub fn insider_fallback(summary: &InsiderSummary) -> SentimentResult {
    if !summary.has_notable() {
        return SentimentResult::neutral(NO_INSIDER_ACTIVITY_SUMMARY);
    }
    SentimentResult::neutral(format!(
        "Recent insider activity for {}: {} notable trades",
        summary.ticker,
        summary.notable.len()
    ))
}

impl std::fmt::Debug for SentimentAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentAnalyzer")
            .field("provider", &self.client.as_ref().map(|c| c.provider()))
            .finish()
    }
}

/// One completion plus a single repair round when the answer is not valid sentiment JSON.
async fn complete_sentiment(client: &dyn LlmClient, prompt: &str) -> anyhow::Result<SentimentResult> {
    let text = client.complete(prompt).await?;
    let first_err = match json::parse_sentiment(&text) {
        Ok(result) => return Ok(result),
        Err(err) => err,
    };

    tracing::warn!(
        provider = %client.provider(),
        error = %first_err,
        "LLM output invalid; sending repair prompt"
    );
    let repaired = client.complete(&repair_prompt(&text)).await?;
    match json::parse_sentiment(&repaired) {
        Ok(result) => Ok(result),
        Err(err) => Err(LlmDiagnosticsError {
            provider: client.provider(),
            stage: "parse_after_repair",
            detail: format!("final_error={err}"),
            raw_output: Some(repaired),
            raw_response_json: None,
        }
        .into()),
    }
}

fn log_failure(ticker: &Ticker, kind: &'static str, err: &anyhow::Error) {
    match err.downcast_ref::<LlmDiagnosticsError>() {
        Some(diag) => tracing::warn!(
            %ticker,
            kind,
            provider = %diag.provider,
            stage = diag.stage,
            raw_output = diag.raw_output.as_deref().unwrap_or(""),
            error = %diag,
            "sentiment analysis failed; using neutral score"
        ),
        None => tracing::warn!(
            %ticker,
            kind,
            error = %err,
            "sentiment analysis failed; using neutral score"
        ),
    }
}

pub(crate) fn news_prompt(
    ticker: &Ticker,
    headlines: &[String],
    fundamentals: &FundamentalsSnapshot,
) -> String {
    let fundamentals_block = if fundamentals.is_empty() {
        "N/A".to_string()
    } else {
        fundamentals
            .entries()
            .into_iter()
            .map(|(k, v)| format!("- {k}: {v}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let headlines_block = if headlines.is_empty() {
        "No recent headlines".to_string()
    } else {
        headlines
            .iter()
            .map(|h| format!("- {h}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "You are a financial analyst helping assess the investment outlook of stocks based on recent news and company fundamentals.\n\n\
Stock: {ticker}\n\n\
Fundamentals:\n{fundamentals_block}\n\n\
Recent News Headlines:\n{headlines_block}\n\n\
Step 1: Briefly summarize the headlines in 2-3 sentences.\n\
Step 2: Based on both news and fundamentals, give a sentiment score from -1 (bearish) to 1 (bullish), with justification.\n\n\
Respond in JSON:\n\
{{\n  \"summary\": \"...\",\n  \"sentiment_score\": 0.0,\n  \"reasoning\": \"...\"\n}}"
    )
}

pub(crate) fn insider_prompt(ticker: &Ticker, trades: &[String]) -> String {
    let trades_block = trades
        .iter()
        .map(|t| format!("- {t}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an insider trading analyst.\n\n\
Summarize the recent insider trading activity for {ticker}.\n\
Evaluate whether the overall sentiment is bullish or bearish and provide a sentiment score from -1 to 1.\n\n\
Here are the recent insider trades:\n{trades_block}\n\n\
Return your response in this JSON format:\n\
{{\n  \"summary\": \"...\",\n  \"sentiment_score\": 0.0\n}}"
    )
}

fn repair_prompt(previous_output: &str) -> String {
    format!(
        "Your previous message was NOT valid JSON.\n\n\
TASK: Output ONLY a single JSON object with keys summary (string), sentiment_score (number from -1 to 1) and optionally reasoning (string).\n\
- Do NOT include any markdown, prose, or code fences.\n\
- Use double quotes for all JSON strings.\n\n\
INVALID OUTPUT (for reference only; DO NOT copy verbatim):\n{previous_output}"
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{InsiderRecord, TransactionType};
    use crate::llm::Provider;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays canned completions in order and counts calls.
    pub(crate) struct ScriptedLlm {
        replies: Mutex<VecDeque<anyhow::Result<String>>>,
        pub calls: AtomicUsize,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        pub(crate) fn new(replies: Vec<anyhow::Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for ScriptedLlm {
        fn provider(&self) -> Provider {
            Provider::OpenAI
        }

        async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted reply left")))
        }
    }

    fn ticker(s: &str) -> Ticker {
        Ticker::parse(s).unwrap()
    }

    fn summary_with_notable(n: usize) -> InsiderSummary {
        let records: Vec<_> = (0..n)
            .map(|_| InsiderRecord {
                insider_name: "Jane Doe".to_string(),
                relationship: "Director".to_string(),
                transaction_date: "2026-01-05".to_string(),
                transaction_type: TransactionType::Purchase,
                shares: 5000.0,
                price_per_share: 10.0,
                total_value: 50000.0,
                filed_date: "2026-01-06".to_string(),
                acquired_disposed: "A".to_string(),
            })
            .collect();
        InsiderSummary::from_records(ticker("AAPL"), &records)
    }

    #[tokio::test]
    async fn news_without_model_is_neutral() {
        let analyzer = SentimentAnalyzer::new(None);
        let r = analyzer
            .analyze_news(&ticker("AAPL"), &[], &FundamentalsSnapshot::default())
            .await;
        assert_eq!(r.summary, NO_KEY_NEWS_SUMMARY);
        assert_eq!(r.sentiment_score, 0.0);
        assert_eq!(r.reasoning, "");
    }

    #[tokio::test]
    async fn news_uses_model_answer() {
        let llm = ScriptedLlm::new(vec![Ok(
            r#"{"summary": "Upbeat.", "sentiment_score": 0.5, "reasoning": "beats"}"#.to_string(),
        )]);
        let analyzer = SentimentAnalyzer::new(Some(llm.clone()));
        let headlines = vec!["Apple beats".to_string()];
        let r = analyzer
            .analyze_news(&ticker("AAPL"), &headlines, &FundamentalsSnapshot::default())
            .await;
        assert_eq!(r.sentiment_score, 0.5);
        assert_eq!(r.summary, "Upbeat.");
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
        assert!(llm.prompts.lock().unwrap()[0].contains("- Apple beats"));
    }

    #[tokio::test]
    async fn invalid_output_is_repaired_once() {
        let llm = ScriptedLlm::new(vec![
            Ok("The outlook is bullish.".to_string()),
            Ok(r#"{"summary": "Bullish.", "sentiment_score": 0.3}"#.to_string()),
        ]);
        let analyzer = SentimentAnalyzer::new(Some(llm.clone()));
        let r = analyzer
            .analyze_news(&ticker("AAPL"), &[], &FundamentalsSnapshot::default())
            .await;
        assert_eq!(r.sentiment_score, 0.3);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn news_failure_falls_back_to_neutral() {
        let llm = ScriptedLlm::new(vec![Err(anyhow::anyhow!("timeout"))]);
        let analyzer = SentimentAnalyzer::new(Some(llm));
        let r = analyzer
            .analyze_news(&ticker("AAPL"), &[], &FundamentalsSnapshot::default())
            .await;
        assert_eq!(r.summary, FAILED_NEWS_SUMMARY);
        assert_eq!(r.sentiment_score, 0.0);
    }

    #[tokio::test]
    async fn insider_without_notable_trades_skips_the_model() {
        let llm = ScriptedLlm::new(vec![]);
        let analyzer = SentimentAnalyzer::new(Some(llm.clone()));
        let r = analyzer
            .analyze_insider(&InsiderSummary::unsupported(ticker("ZZZZ")))
            .await;
        assert_eq!(r.summary, NO_INSIDER_ACTIVITY_SUMMARY);
        assert_eq!(r.sentiment_score, 0.0);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn insider_fallbacks_count_notable_trades() {
        let summary = summary_with_notable(2);

        let r = SentimentAnalyzer::new(None).analyze_insider(&summary).await;
        assert_eq!(r.summary, "Recent insider activity for AAPL: 2 notable trades");

        let llm = ScriptedLlm::new(vec![Ok("nope".to_string()), Ok("still nope".to_string())]);
        let r = SentimentAnalyzer::new(Some(llm))
            .analyze_insider(&summary)
            .await;
        assert_eq!(r.summary, "Recent insider activity for AAPL: 2 notable trades");
        assert_eq!(r.sentiment_score, 0.0);
    }

    #[test]
    fn news_prompt_marks_missing_inputs() {
        let p = news_prompt(&ticker("AAPL"), &[], &FundamentalsSnapshot::default());
        assert!(p.contains("Fundamentals:\nN/A"));
        assert!(p.contains("Recent News Headlines:\nNo recent headlines"));

        let f = FundamentalsSnapshot {
            pe_ratio: Some(28.5),
            ..Default::default()
        };
        let p = news_prompt(&ticker("AAPL"), &["h1".to_string()], &f);
        assert!(p.contains("- PE: 28.5"));
        assert!(p.contains("- h1"));
    }
}
