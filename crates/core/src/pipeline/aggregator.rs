use crate::config::Settings;
use crate::domain::{InsiderSummary, SentimentResult, Signal, Ticker, TickerAnalysis};
use crate::ingest::alpha_vantage::AlphaVantageClient;
use crate::ingest::google_news::GoogleNewsClient;
use crate::ingest::sec_insider::SecInsiderClient;
use crate::ingest::{FetchOutcome, FundamentalsSource, InsiderSource, NewsSource, PriceSource};
use crate::llm::sentiment::{insider_fallback, SentimentAnalyzer, FAILED_NEWS_SUMMARY};
use crate::scoring::{self, ScoringWeights};
use anyhow::Context;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const DEFAULT_NEWS_LIMIT: usize = 3;
const DEFAULT_TICKER_TIMEOUT: Duration = Duration::from_secs(120);

/// The four upstream fetchers one analysis fans out to.
#[derive(Clone)]
pub struct Sources {
    pub price: Arc<dyn PriceSource>,
    pub fundamentals: Arc<dyn FundamentalsSource>,
    pub news: Arc<dyn NewsSource>,
    pub insider: Arc<dyn InsiderSource>,
}

impl Sources {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let alpha_vantage = Arc::new(AlphaVantageClient::from_settings(settings)?);
        Ok(Self {
            price: alpha_vantage.clone(),
            fundamentals: alpha_vantage,
            news: Arc::new(GoogleNewsClient::from_env()?),
            insider: Arc::new(SecInsiderClient::from_settings(settings)?),
        })
    }
}

/// Turns one ticker into a scored `Signal`.
#[derive(Clone)]
pub struct SignalAggregator {
    sources: Sources,
    sentiment: SentimentAnalyzer,
    weights: ScoringWeights,
    news_limit: usize,
    ticker_timeout: Duration,
}

impl SignalAggregator {
    pub fn new(sources: Sources, sentiment: SentimentAnalyzer, weights: ScoringWeights) -> Self {
        Self {
            sources,
            sentiment,
            weights,
            news_limit: DEFAULT_NEWS_LIMIT,
            ticker_timeout: DEFAULT_TICKER_TIMEOUT,
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        settings
            .weights
            .validate()
            .context("invalid scoring weights")?;

        Ok(Self::new(
            Sources::from_settings(settings)?,
            SentimentAnalyzer::from_settings(settings)?,
            settings.weights,
        )
        .with_news_limit(settings.news_limit)
        .with_ticker_timeout(Duration::from_secs(settings.ticker_timeout_secs)))
    }

    pub fn with_news_limit(mut self, limit: usize) -> Self {
        self.news_limit = limit;
        self
    }

    pub fn with_ticker_timeout(mut self, timeout: Duration) -> Self {
        self.ticker_timeout = timeout;
        self
    }

    pub fn weights(&self) -> ScoringWeights {
        self.weights
    }

    /// Parses `raw` and analyzes it. Invalid syntax and a blown time budget are errors; upstream
    /// trouble only degrades the signal.
    pub async fn analyze_symbol(&self, raw: &str) -> anyhow::Result<TickerAnalysis> {
        let ticker = Ticker::parse(raw).with_context(|| format!("invalid ticker {raw:?}"))?;
        self.analyze(&ticker).await
    }

    pub async fn analyze(&self, ticker: &Ticker) -> anyhow::Result<TickerAnalysis> {
        tokio::time::timeout(self.ticker_timeout, self.analyze_unbounded(ticker))
            .await
            .with_context(|| {
                format!(
                    "analysis of {ticker} exceeded {}s",
                    self.ticker_timeout.as_secs()
                )
            })
    }

    async fn analyze_unbounded(&self, ticker: &Ticker) -> TickerAnalysis {
        // Sentiment gets three quarters of the ticker budget; past that it scores neutral.
        let sentiment_deadline = Instant::now() + self.ticker_timeout * 3 / 4;

        let (price, fundamentals, headlines, insider) = tokio::join!(
            self.sources.price.price_change_pct(ticker),
            self.sources.fundamentals.fundamentals(ticker),
            self.sources.news.headlines(ticker, self.news_limit),
            self.sources.insider.insider_records(ticker),
        );

        let pct_change = price.unwrap_or_log(self.sources.price.provider_name(), ticker);
        let fundamentals =
            fundamentals.unwrap_or_log(self.sources.fundamentals.provider_name(), ticker);
        let headlines = headlines.unwrap_or_log(self.sources.news.provider_name(), ticker);
        let insider_data = match insider {
            FetchOutcome::Ok(records) => InsiderSummary::from_records(ticker.clone(), &records),
            FetchOutcome::Unsupported => InsiderSummary::unsupported(ticker.clone()),
            FetchOutcome::Degraded(err) => {
                tracing::warn!(
                    %ticker,
                    source = self.sources.insider.provider_name(),
                    error = %err,
                    "insider fetch degraded; treating as no data"
                );
                InsiderSummary::no_data(ticker.clone())
            }
        };

        let (news_analysis, insider_analysis) = tokio::join!(
            sentiment_before(
                sentiment_deadline,
                ticker,
                "news",
                self.sentiment.analyze_news(ticker, &headlines, &fundamentals),
                || SentimentResult::neutral(FAILED_NEWS_SUMMARY),
            ),
            sentiment_before(
                sentiment_deadline,
                ticker,
                "insider",
                self.sentiment.analyze_insider(&insider_data),
                || insider_fallback(&insider_data),
            ),
        );

        let price_score = scoring::price_score(pct_change);
        let insider_score =
            scoring::insider_score(insider_data.recent_buys, insider_data.recent_sells);
        let score = self.weights.final_score(
            price_score,
            news_analysis.sentiment_score,
            insider_score,
        );
        let (signal, confidence) = scoring::classify(score);

        tracing::info!(
            %ticker,
            %signal,
            %confidence,
            score,
            price_score,
            news_score = news_analysis.sentiment_score,
            insider_score,
            "ticker analyzed"
        );

        TickerAnalysis {
            signal: Signal {
                ticker: ticker.clone(),
                signal,
                confidence,
                score,
                price_change_pct: pct_change.map(|p| scoring::round_to(p, 2)),
                news_analysis,
                insider_data,
                insider_analysis,
                fundamentals,
            },
            headlines,
            generated_at: chrono::Utc::now(),
        }
    }
}

async fn sentiment_before(
    deadline: Instant,
    ticker: &Ticker,
    kind: &'static str,
    analysis: impl Future<Output = SentimentResult>,
    fallback: impl FnOnce() -> SentimentResult,
) -> SentimentResult {
    match tokio::time::timeout_at(deadline, analysis).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(%ticker, kind, "sentiment analysis ran out of time; using neutral score");
            fallback()
        }
    }
}
