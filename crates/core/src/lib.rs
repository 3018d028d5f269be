pub mod delivery;
pub mod domain;
pub mod ingest;
pub mod interactive;
pub mod llm;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod storage;

pub mod config {
    use crate::scoring::ScoringWeights;
    use anyhow::Context;
    use std::path::PathBuf;

    const DEFAULT_LOGS_DIR: &str = "logs";
    const DEFAULT_TICKERS_PATH: &str = "data/stocks.json";
    const DEFAULT_NEWS_LIMIT: usize = 3;
    const DEFAULT_RUN_CONCURRENCY: usize = 1;
    const DEFAULT_TICKER_TIMEOUT_SECS: u64 = 120;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub alpha_vantage_api_key: Option<String>,
        pub sec_api_key: Option<String>,
        pub openai_api_key: Option<String>,
        pub anthropic_api_key: Option<String>,
        pub llm_provider: Option<String>,
        pub discord_webhook_url: Option<String>,
        pub discord_bot_token: Option<String>,
        pub sentry_dsn: Option<String>,
        pub logs_dir: PathBuf,
        pub tickers_path: PathBuf,
        pub news_limit: usize,
        pub run_concurrency: usize,
        pub ticker_timeout_secs: u64,
        pub weights: ScoringWeights,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let weights = weights_from_env()?;

            Ok(Self {
                alpha_vantage_api_key: non_empty_var("ALPHA_VANTAGE_API_KEY"),
                sec_api_key: non_empty_var("SEC_API_KEY"),
                openai_api_key: non_empty_var("OPENAI_API_KEY"),
                anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),
                llm_provider: non_empty_var("LLM_PROVIDER"),
                discord_webhook_url: non_empty_var("DISCORD_WEBHOOK_URL"),
                discord_bot_token: non_empty_var("DISCORD_BOT_TOKEN"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                logs_dir: non_empty_var("LOGS_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_LOGS_DIR)),
                tickers_path: non_empty_var("TICKERS_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_TICKERS_PATH)),
                news_limit: parsed_var("NEWS_LIMIT").unwrap_or(DEFAULT_NEWS_LIMIT),
                run_concurrency: parsed_var::<usize>("RUN_CONCURRENCY")
                    .unwrap_or(DEFAULT_RUN_CONCURRENCY)
                    .max(1),
                ticker_timeout_secs: parsed_var("TICKER_TIMEOUT_SECS")
                    .unwrap_or(DEFAULT_TICKER_TIMEOUT_SECS),
                weights,
            })
        }

        pub fn require_openai_api_key(&self) -> anyhow::Result<&str> {
            self.openai_api_key
                .as_deref()
                .context("OPENAI_API_KEY is required")
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required")
        }

        pub fn require_discord_bot_token(&self) -> anyhow::Result<&str> {
            self.discord_bot_token
                .as_deref()
                .context("DISCORD_BOT_TOKEN is required")
        }
    }

    fn weights_from_env() -> anyhow::Result<ScoringWeights> {
        let defaults = ScoringWeights::default();
        let weights = ScoringWeights {
            price: parsed_var("SCORE_WEIGHT_PRICE").unwrap_or(defaults.price),
            news: parsed_var("SCORE_WEIGHT_NEWS").unwrap_or(defaults.news),
            insider: parsed_var("SCORE_WEIGHT_INSIDER").unwrap_or(defaults.insider),
        };
        weights
            .validate()
            .context("invalid SCORE_WEIGHT_* configuration")?;
        Ok(weights)
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub(crate) fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
    }
}
