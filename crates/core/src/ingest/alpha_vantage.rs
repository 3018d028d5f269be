use crate::config::Settings;
use crate::domain::{FundamentalsSnapshot, Ticker};
use crate::ingest::provider::{send_with_retry, HttpOptions};
use crate::ingest::{FetchError, FetchOutcome, FundamentalsSource, PriceSource};
use serde_json::Value;

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
const DAILY_SERIES_KEY: &str = "Time Series (Daily)";
const CLOSE_KEY: &str = "4. close";

/// Market-data client for daily closes and company overviews.
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    attempts: u32,
}

impl AlphaVantageClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let options = HttpOptions::from_env();
        let base_url = std::env::var("ALPHA_VANTAGE_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            http: options.build_client("alpha vantage")?,
            base_url,
            api_key: settings.alpha_vantage_api_key.clone(),
            attempts: options.attempts,
        })
    }

    async fn query(&self, function: &'static str, ticker: &Ticker) -> Result<Value, FetchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(FetchError::MissingCredential("ALPHA_VANTAGE_API_KEY"))?;

        let text = send_with_retry("alpha_vantage", self.attempts, || {
            self.http.get(&self.base_url).query(&[
                ("function", function),
                ("symbol", ticker.as_str()),
                ("outputsize", "compact"),
                ("apikey", api_key),
            ])
        })
        .await?;

        let body = serde_json::from_str::<Value>(&text)
            .map_err(|err| FetchError::Malformed(format!("invalid JSON from {function}: {err}")))?;
        check_upstream_error(&body)?;
        Ok(body)
    }
}

#[async_trait::async_trait]
impl PriceSource for AlphaVantageClient {
    fn provider_name(&self) -> &'static str {
        "alpha_vantage"
    }

    async fn price_change_pct(&self, ticker: &Ticker) -> FetchOutcome<Option<f64>> {
        let body = match self.query("TIME_SERIES_DAILY_ADJUSTED", ticker).await {
            Ok(body) => body,
            Err(err) => return FetchOutcome::Degraded(err),
        };
        parse_daily_change_pct(&body).into()
    }
}

#[async_trait::async_trait]
impl FundamentalsSource for AlphaVantageClient {
    fn provider_name(&self) -> &'static str {
        "alpha_vantage"
    }

    async fn fundamentals(&self, ticker: &Ticker) -> FetchOutcome<FundamentalsSnapshot> {
        match self.query("OVERVIEW", ticker).await {
            Ok(body) => FetchOutcome::Ok(parse_overview(&body)),
            Err(err) => FetchOutcome::Degraded(err),
        }
    }
}

// The provider answers throttling and bad symbols with HTTP 200 and a message body.
fn check_upstream_error(body: &Value) -> Result<(), FetchError> {
    for key in ["Error Message", "Note", "Information"] {
        if let Some(msg) = body.get(key) {
            let msg = msg.as_str().map(str::to_string).unwrap_or_else(|| msg.to_string());
            return Err(FetchError::Upstream(msg));
        }
    }
    Ok(())
}

pub(crate) fn parse_daily_change_pct(body: &Value) -> Result<Option<f64>, FetchError> {
    let Some(series) = body.get(DAILY_SERIES_KEY).and_then(Value::as_object) else {
        return Ok(None);
    };
    if series.len() < 2 {
        return Ok(None);
    }

    let mut dates: Vec<&String> = series.keys().collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));

    let last_close = close_on(series, dates[0])?;
    let prev_close = close_on(series, dates[1])?;
    if prev_close == 0.0 {
        return Err(FetchError::Malformed(format!(
            "previous close is zero on {}",
            dates[1]
        )));
    }

    Ok(Some((last_close - prev_close) / prev_close * 100.0))
}

fn close_on(series: &serde_json::Map<String, Value>, date: &str) -> Result<f64, FetchError> {
    series
        .get(date)
        .and_then(|bar| bar.get(CLOSE_KEY))
        .and_then(json_number)
        .ok_or_else(|| FetchError::Malformed(format!("missing close on {date}")))
}

/// Missing `Symbol` means the provider does not know the ticker; that is an empty snapshot,
/// not an error.
pub(crate) fn parse_overview(body: &Value) -> FundamentalsSnapshot {
    if body.get("Symbol").is_none() {
        return FundamentalsSnapshot::default();
    }

    FundamentalsSnapshot {
        pe_ratio: body.get("PERatio").and_then(json_number),
        eps: body.get("EPS").and_then(json_number),
        market_cap: body.get("MarketCapitalization").and_then(json_number),
        sector: body
            .get("Sector")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !is_placeholder(s))
            .map(str::to_string),
        return_on_equity: body.get("ReturnOnEquityTTM").and_then(json_number),
    }
}

fn json_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let t = s.trim();
            if is_placeholder(t) {
                return None;
            }
            t.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

fn is_placeholder(s: &str) -> bool {
    s.is_empty() || s == "-" || s.eq_ignore_ascii_case("none")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn computes_change_from_two_most_recent_closes() {
        let body = json!({
            "Meta Data": {"2. Symbol": "AAPL"},
            "Time Series (Daily)": {
                "2026-01-26": {"4. close": "100.0"},
                "2026-01-28": {"4. close": "103.0"},
                "2026-01-27": {"4. close": "100.0"},
            }
        });
        let pct = parse_daily_change_pct(&body).unwrap().unwrap();
        assert!((pct - 3.0).abs() < 1e-9);
    }

    #[test]
    fn fewer_than_two_points_is_no_data() {
        let one = json!({"Time Series (Daily)": {"2026-01-28": {"4. close": "103.0"}}});
        assert_eq!(parse_daily_change_pct(&one).unwrap(), None);
        assert_eq!(parse_daily_change_pct(&json!({})).unwrap(), None);
    }

    #[test]
    fn unparseable_close_is_malformed() {
        let body = json!({
            "Time Series (Daily)": {
                "2026-01-28": {"4. close": "n/a"},
                "2026-01-27": {"4. close": "100.0"},
            }
        });
        assert!(matches!(
            parse_daily_change_pct(&body),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn zero_previous_close_is_malformed() {
        let body = json!({
            "Time Series (Daily)": {
                "2026-01-28": {"4. close": "1.0"},
                "2026-01-27": {"4. close": "0"},
            }
        });
        assert!(parse_daily_change_pct(&body).is_err());
    }

    #[test]
    fn throttling_note_is_an_upstream_error() {
        let body = json!({"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."});
        assert!(matches!(
            check_upstream_error(&body),
            Err(FetchError::Upstream(msg)) if msg.starts_with("Thank you")
        ));
        assert!(check_upstream_error(&json!({"Symbol": "AAPL"})).is_ok());
    }

    #[test]
    fn overview_extracts_known_fields_and_skips_placeholders() {
        let body = json!({
            "Symbol": "AAPL",
            "PERatio": "28.5",
            "EPS": "6.42",
            "MarketCapitalization": "3000000000000",
            "Sector": "TECHNOLOGY",
            "ReturnOnEquityTTM": "None",
            "Beta": "1.2",
        });
        let f = parse_overview(&body);
        assert_eq!(f.pe_ratio, Some(28.5));
        assert_eq!(f.eps, Some(6.42));
        assert_eq!(f.market_cap, Some(3.0e12));
        assert_eq!(f.sector.as_deref(), Some("TECHNOLOGY"));
        assert_eq!(f.return_on_equity, None);
    }

    #[test]
    fn overview_without_symbol_is_empty() {
        let f = parse_overview(&json!({"PERatio": "10"}));
        assert!(f.is_empty());
    }

    fn unreachable_client(api_key: Option<&str>) -> AlphaVantageClient {
        AlphaVantageClient {
            http: reqwest::Client::new(),
            base_url: "http://127.0.0.1:9/query".to_string(),
            api_key: api_key.map(str::to_string),
            attempts: 1,
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_degrades() {
        let client = unreachable_client(Some("demo"));
        let aapl = Ticker::parse("AAPL").unwrap();

        let price = client.price_change_pct(&aapl).await;
        assert!(matches!(price, FetchOutcome::Degraded(FetchError::Transport(_))));
        assert!(client.fundamentals(&aapl).await.is_degraded());
    }

    #[tokio::test]
    async fn missing_api_key_degrades_without_a_request() {
        let client = unreachable_client(None);
        let outcome = client.price_change_pct(&Ticker::parse("AAPL").unwrap()).await;
        assert!(matches!(
            outcome,
            FetchOutcome::Degraded(FetchError::MissingCredential("ALPHA_VANTAGE_API_KEY"))
        ));
    }
}
