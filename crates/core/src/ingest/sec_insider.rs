use crate::config::Settings;
use crate::domain::{InsiderRecord, Ticker, TransactionType};
use crate::ingest::provider::{send_with_retry, HttpOptions};
use crate::ingest::{FetchError, FetchOutcome, InsiderSource};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

const DEFAULT_ENDPOINT: &str = "https://api.sec-api.io/insider-trading";
const PAGE_SIZE: &str = "50";
const MAX_FILINGS: usize = 10;

/// Maps a ticker to the issuer's SEC central index key. Tickers without a CIK are reported as
/// unsupported instead of being queried.
#[async_trait::async_trait]
pub trait CikResolver: Send + Sync {
    async fn resolve_cik(&self, ticker: &Ticker) -> Option<String>;
}

#[derive(Debug, Clone)]
pub struct StaticCikTable {
    table: HashMap<String, String>,
}

impl StaticCikTable {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            table: entries
                .into_iter()
                .map(|(k, v)| (k.into().to_ascii_uppercase(), v.into()))
                .collect(),
        }
    }
}

impl Default for StaticCikTable {
    fn default() -> Self {
        Self::new([
            ("AAPL", "320193"),
            ("MSFT", "789019"),
            ("TSLA", "1318605"),
            ("AMZN", "1018724"),
            ("GOOGL", "1652044"),
            ("GOOG", "1652044"),
            ("META", "1326801"),
            ("FB", "1326801"),
            ("NVDA", "1045810"),
            ("NFLX", "1065280"),
            ("AMD", "2488"),
            ("INTC", "50863"),
            ("JPM", "19617"),
            ("BAC", "70858"),
            ("WMT", "104169"),
            ("JNJ", "200406"),
            ("PG", "80424"),
            ("UNH", "731766"),
            ("HD", "354950"),
            ("V", "1403161"),
            ("ASTS", "1845524"),
            ("IBM", "51143"),
            ("SOUN", "1844791"),
            ("BSX", "885725"),
        ])
    }
}

#[async_trait::async_trait]
impl CikResolver for StaticCikTable {
    async fn resolve_cik(&self, ticker: &Ticker) -> Option<String> {
        self.table.get(ticker.as_str()).cloned()
    }
}

pub struct SecInsiderClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    attempts: u32,
    resolver: Arc<dyn CikResolver>,
}

impl SecInsiderClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let options = HttpOptions::from_env();
        let endpoint = std::env::var("SEC_API_ENDPOINT")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        Ok(Self {
            http: options.build_client("sec-api")?,
            endpoint,
            api_key: settings.sec_api_key.clone(),
            attempts: options.attempts,
            resolver: Arc::new(StaticCikTable::default()),
        })
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn CikResolver>) -> Self {
        self.resolver = resolver;
        self
    }
}

#[async_trait::async_trait]
impl InsiderSource for SecInsiderClient {
    fn provider_name(&self) -> &'static str {
        "sec_api"
    }

    async fn insider_records(&self, ticker: &Ticker) -> FetchOutcome<Vec<InsiderRecord>> {
        let Some(cik) = self.resolver.resolve_cik(ticker).await else {
            return FetchOutcome::Unsupported;
        };
        let Some(api_key) = self.api_key.as_deref() else {
            return FetchOutcome::Degraded(FetchError::MissingCredential("SEC_API_KEY"));
        };
        tracing::debug!(%ticker, cik = %cik, "fetching insider filings");

        let payload = json!({
            "query": format!("issuer.tradingSymbol:{ticker}"),
            "from": "0",
            "size": PAGE_SIZE,
            "sort": [{"filedAt": {"order": "desc"}}],
        });

        let text = match send_with_retry("sec_api", self.attempts, || {
            self.http
                .post(&self.endpoint)
                .header(reqwest::header::AUTHORIZATION, api_key)
                .json(&payload)
        })
        .await
        {
            Ok(text) => text,
            Err(err) => return FetchOutcome::Degraded(err),
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(body) => FetchOutcome::Ok(parse_insider_transactions(&body)),
            Err(err) => FetchOutcome::Degraded(FetchError::Malformed(format!(
                "invalid JSON from sec-api: {err}"
            ))),
        }
    }
}

/// Flattens the non-derivative transactions of the ten most recent filings. Each
/// transaction inherits its filing's reporting owner and filing date.
pub fn parse_insider_transactions(body: &Value) -> Vec<InsiderRecord> {
    let Some(filings) = body.get("transactions").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut records = Vec::new();
    for filing in filings.iter().take(MAX_FILINGS) {
        let owner = filing.get("reportingOwner");
        let insider_name = owner
            .and_then(|o| o.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string();
        let relationship = describe_relationship(owner.and_then(|o| o.get("relationship")));
        let filed_date: String = filing
            .get("filedAt")
            .and_then(Value::as_str)
            .map(|s| s.chars().take(10).collect())
            .unwrap_or_default();

        let Some(txns) = filing
            .get("nonDerivativeTable")
            .and_then(|t| t.get("transactions"))
            .and_then(Value::as_array)
        else {
            continue;
        };

        for txn in txns {
            let amounts = txn.get("amounts");
            let shares = amounts.and_then(|a| a.get("shares")).map_or(0.0, coerce_f64);
            let price = amounts
                .and_then(|a| a.get("pricePerShare"))
                .map_or(0.0, coerce_f64);
            let acquired_disposed = amounts
                .and_then(|a| a.get("acquiredDisposedCode"))
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string();
            let code = txn
                .get("coding")
                .and_then(|c| c.get("code"))
                .and_then(Value::as_str)
                .unwrap_or("Unknown");

            records.push(InsiderRecord {
                insider_name: insider_name.clone(),
                relationship: relationship.clone(),
                transaction_date: txn
                    .get("transactionDate")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                transaction_type: TransactionType::from_code(code),
                shares,
                price_per_share: price,
                total_value: shares * price,
                filed_date: filed_date.clone(),
                acquired_disposed,
            });
        }
    }
    records
}

fn describe_relationship(rel: Option<&Value>) -> String {
    fn flag(rel: Option<&Value>, key: &str) -> bool {
        rel.and_then(|r| r.get(key))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
    fn text(rel: Option<&Value>, key: &str, default: &str) -> String {
        rel.and_then(|r| r.get(key))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(default)
            .to_string()
    }

    let mut roles = Vec::new();
    if flag(rel, "isDirector") {
        roles.push("Director".to_string());
    }
    if flag(rel, "isOfficer") {
        roles.push(format!("Officer ({})", text(rel, "officerTitle", "Unknown")));
    }
    if flag(rel, "isTenPercentOwner") {
        roles.push("10% Owner".to_string());
    }
    if flag(rel, "isOther") {
        roles.push(format!("Other ({})", text(rel, "otherText", "Other")));
    }

    if roles.is_empty() {
        "Company Insider".to_string()
    } else {
        roles.join(", ")
    }
}

fn coerce_f64(v: &Value) -> f64 {
    match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}
