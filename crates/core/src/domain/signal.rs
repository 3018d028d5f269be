use crate::domain::{FundamentalsSnapshot, InsiderSummary, Ticker};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
            Self::Hold => "Hold",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Low,
    Neutral,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "High",
            Self::Low => "Low",
            Self::Neutral => "Neutral",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub summary: String,
    pub sentiment_score: f64,
    #[serde(default)]
    pub reasoning: String,
}

impl SentimentResult {
    pub fn neutral(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            sentiment_score: 0.0,
            reasoning: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub ticker: Ticker,
    pub signal: SignalKind,
    pub confidence: Confidence,
    pub score: f64,
    pub price_change_pct: Option<f64>,
    pub news_analysis: SentimentResult,
    pub insider_data: InsiderSummary,
    pub insider_analysis: SentimentResult,
    pub fundamentals: FundamentalsSnapshot,
}

/// One ticker's pipeline output: the signal plus the headlines it was scored on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerAnalysis {
    pub signal: Signal,
    pub headlines: Vec<String>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}
