use crate::domain::{Signal, Ticker};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const AGENT_NAME: &str = "DST";

/// Output of one run. Persisted once as a dated JSON artifact and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub agent: String,
    pub run_id: uuid::Uuid,
    pub date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub buy: Vec<Ticker>,
    pub sell: Vec<Ticker>,
    pub hold: Vec<Ticker>,
    pub signals: Vec<Signal>,
    #[serde(default)]
    pub skipped: Vec<String>,
    #[serde(default)]
    pub news: Vec<TickerNews>,
    #[serde(default)]
    pub insider_activity: Vec<String>,
}

/// Headlines for one top mover. Entries keep top-mover order: buys first, then sells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerNews {
    pub ticker: Ticker,
    pub headlines: Vec<String>,
}
