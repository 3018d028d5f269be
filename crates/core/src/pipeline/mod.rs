pub mod aggregator;

pub use aggregator::{SignalAggregator, Sources};

use crate::domain::{SignalKind, Ticker, TickerAnalysis};
use futures::stream::{self, StreamExt};

/// Result of a run over a ticker list. `analyses` keeps input order; failed tickers appear
/// only in `skipped`.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub analyses: Vec<TickerAnalysis>,
    pub skipped: Vec<String>,
}

impl RunOutcome {
    pub fn tickers_with(&self, kind: SignalKind) -> Vec<Ticker> {
        self.analyses
            .iter()
            .filter(|a| a.signal.signal == kind)
            .map(|a| a.signal.ticker.clone())
            .collect()
    }
}

impl SignalAggregator {
    /// Analyzes every symbol independently, at most `concurrency` at a time. One ticker's
    /// failure never affects the others.
    pub async fn run(&self, symbols: &[String], concurrency: usize) -> RunOutcome {
        let results: Vec<(&String, anyhow::Result<TickerAnalysis>)> = stream::iter(symbols)
            .map(|symbol| async move { (symbol, self.analyze_symbol(symbol).await) })
            .buffered(concurrency.max(1))
            .collect()
            .await;

        let mut outcome = RunOutcome::default();
        for (symbol, result) in results {
            match result {
                Ok(analysis) => outcome.analyses.push(analysis),
                Err(err) => {
                    tracing::error!(ticker = %symbol, error = %format!("{err:#}"), "ticker skipped");
                    outcome.skipped.push(symbol.clone());
                }
            }
        }

        tracing::info!(
            analyzed = outcome.analyses.len(),
            skipped = outcome.skipped.len(),
            "run finished"
        );
        outcome
    }
}
