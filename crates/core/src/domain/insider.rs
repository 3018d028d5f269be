use crate::domain::Ticker;
use serde::{Deserialize, Serialize};
use std::fmt;

const NOTABLE_MIN_SHARES: f64 = 1000.0;
const NOTABLE_MIN_VALUE: f64 = 50_000.0;
const MAX_NOTABLE_TRADES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum TransactionType {
    Purchase,
    Sale,
    Grant,
    Disposition,
    Tax,
    Gift,
    /// `J` filings carry no code detail; unknown codes keep theirs.
    Other(Option<String>),
}

impl TransactionType {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "P" => Self::Purchase,
            "S" => Self::Sale,
            "A" => Self::Grant,
            "D" => Self::Disposition,
            "F" => Self::Tax,
            "G" => Self::Gift,
            "J" => Self::Other(None),
            other => Self::Other(Some(other.to_string())),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Purchase => "Purchase".to_string(),
            Self::Sale => "Sale".to_string(),
            Self::Grant => "Grant/Award".to_string(),
            Self::Disposition => "Disposition".to_string(),
            Self::Tax => "Tax Payment".to_string(),
            Self::Gift => "Gift".to_string(),
            Self::Other(None) => "Other".to_string(),
            Self::Other(Some(code)) => format!("Other ({code})"),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<TransactionType> for String {
    fn from(value: TransactionType) -> Self {
        value.label()
    }
}

impl From<String> for TransactionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Purchase" => Self::Purchase,
            "Sale" => Self::Sale,
            "Grant/Award" => Self::Grant,
            "Disposition" => Self::Disposition,
            "Tax Payment" => Self::Tax,
            "Gift" => Self::Gift,
            "Other" => Self::Other(None),
            other => {
                let code = other
                    .strip_prefix("Other (")
                    .and_then(|s| s.strip_suffix(')'))
                    .unwrap_or(other);
                Self::Other(Some(code.to_string()))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeDirection {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsiderRecord {
    pub insider_name: String,
    pub relationship: String,
    pub transaction_date: String,
    pub transaction_type: TransactionType,
    pub shares: f64,
    pub price_per_share: f64,
    pub total_value: f64,
    pub filed_date: String,
    pub acquired_disposed: String,
}

impl InsiderRecord {
    pub fn is_notable(&self) -> bool {
        self.shares > NOTABLE_MIN_SHARES || self.total_value > NOTABLE_MIN_VALUE
    }

    /// Purchases and grants are buys, sales are sells. Every other type falls back to the
    /// acquired/disposed flag.
    pub fn direction(&self) -> Option<TradeDirection> {
        match self.transaction_type {
            TransactionType::Purchase | TransactionType::Grant => Some(TradeDirection::Buy),
            TransactionType::Sale => Some(TradeDirection::Sell),
            _ => match self.acquired_disposed.trim() {
                "A" => Some(TradeDirection::Buy),
                "D" => Some(TradeDirection::Sell),
                _ => None,
            },
        }
    }

    pub fn describe(&self, ticker: &Ticker) -> String {
        format!(
            "{} ({}) - {} {}: {} shares @ ${:.2}",
            self.insider_name,
            self.relationship,
            ticker,
            self.transaction_type,
            group_thousands(self.shares),
            self.price_per_share
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsiderAvailability {
    Available,
    NoData,
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsiderSummary {
    pub ticker: Ticker,
    pub availability: InsiderAvailability,
    pub recent_buys: u32,
    pub recent_sells: u32,
    pub last_activity: Option<String>,
    pub notable: Vec<String>,
}

impl InsiderSummary {
    pub fn no_data(ticker: Ticker) -> Self {
        Self::empty(ticker, InsiderAvailability::NoData)
    }

    pub fn unsupported(ticker: Ticker) -> Self {
        Self::empty(ticker, InsiderAvailability::Unsupported)
    }

    fn empty(ticker: Ticker, availability: InsiderAvailability) -> Self {
        Self {
            ticker,
            availability,
            recent_buys: 0,
            recent_sells: 0,
            last_activity: None,
            notable: Vec::new(),
        }
    }

    /// Notable trades are the first five encountered, in filing order. They are not ranked by
    /// size.
    pub fn from_records(ticker: Ticker, records: &[InsiderRecord]) -> Self {
        if records.is_empty() {
            return Self::no_data(ticker);
        }

        let mut buys = 0;
        let mut sells = 0;
        let mut notable = Vec::new();
        let mut latest: Option<&str> = None;

        for record in records {
            match record.direction() {
                Some(TradeDirection::Buy) => buys += 1,
                Some(TradeDirection::Sell) => sells += 1,
                None => {}
            }

            if record.is_notable() && notable.len() < MAX_NOTABLE_TRADES {
                notable.push(record.describe(&ticker));
            }

            let date = record.transaction_date.trim();
            if !date.is_empty() && latest.map_or(true, |cur| date > cur) {
                latest = Some(date);
            }
        }

        Self {
            last_activity: latest.map(str::to_string),
            ticker,
            availability: InsiderAvailability::Available,
            recent_buys: buys,
            recent_sells: sells,
            notable,
        }
    }

    pub fn has_notable(&self) -> bool {
        self.availability == InsiderAvailability::Available && !self.notable.is_empty()
    }

    /// Notable trades, or a single placeholder line explaining why there are none.
    pub fn notable_display(&self) -> Vec<String> {
        match self.availability {
            InsiderAvailability::Available if !self.notable.is_empty() => self.notable.clone(),
            InsiderAvailability::Available => vec!["No notable trades".to_string()],
            InsiderAvailability::NoData => vec!["No insider data available".to_string()],
            InsiderAvailability::Unsupported => {
                vec![format!("Insider data not supported for {}", self.ticker)]
            }
        }
    }

    pub fn last_activity_display(&self) -> &str {
        self.last_activity.as_deref().unwrap_or("N/A")
    }
}

fn group_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let mut out = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, ch) in rounded.chars().enumerate() {
        if i != 0 && (rounded.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0.0 && rounded != "0" {
        out.insert(0, '-');
    }
    out
}
