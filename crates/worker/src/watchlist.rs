use anyhow::Context;
use dst_core::domain::Ticker;
use std::path::Path;

/// `--tickers AAPL,msft, TSLA` as raw entries.
pub fn from_arg(arg: &str) -> Vec<String> {
    arg.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads a JSON array of ticker strings.
pub async fn load_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("read ticker list {} failed", path.display()))?;
    serde_json::from_slice::<Vec<String>>(&bytes)
        .with_context(|| format!("{} must be a JSON array of strings", path.display()))
}

/// Canonical tickers in first-seen order. Invalid entries are logged and dropped.
pub fn normalize(raw: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for entry in raw {
        match Ticker::parse(&entry) {
            Ok(ticker) => {
                let s = ticker.to_string();
                if !out.contains(&s) {
                    out.push(s);
                }
            }
            Err(err) => tracing::warn!(entry = %entry, error = %err, "dropping invalid ticker"),
        }
    }
    out
}
