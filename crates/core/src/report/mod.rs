pub mod format;
pub mod split;

pub use format::format_report;
pub use split::{split_message, DEFAULT_MAX_MESSAGE_CHARS};

use crate::domain::report::AGENT_NAME;
use crate::domain::{InsiderAvailability, Report, SignalKind, Ticker, TickerNews};
use crate::pipeline::RunOutcome;
use chrono::NaiveDate;

const TOP_MOVERS_PER_SIDE: usize = 2;

impl Report {
    /// Builds the run's report from already-fetched data. Nothing is refetched: headlines and
    /// notable trades come from the analyses themselves.
    pub fn assemble(date: NaiveDate, outcome: RunOutcome) -> Self {
        let buy = outcome.tickers_with(SignalKind::Buy);
        let sell = outcome.tickers_with(SignalKind::Sell);
        let hold = outcome.tickers_with(SignalKind::Hold);

        let top_movers: Vec<&Ticker> = buy
            .iter()
            .take(TOP_MOVERS_PER_SIDE)
            .chain(sell.iter().take(TOP_MOVERS_PER_SIDE))
            .collect();

        let mut news = Vec::new();
        let mut insider_activity = Vec::new();
        for ticker in &top_movers {
            let Some(analysis) = outcome
                .analyses
                .iter()
                .find(|a| &a.signal.ticker == *ticker)
            else {
                continue;
            };

            news.push(TickerNews {
                ticker: (*ticker).clone(),
                headlines: analysis.headlines.clone(),
            });

            let insider = &analysis.signal.insider_data;
            if insider.availability == InsiderAvailability::Available {
                insider_activity.extend(insider.notable.iter().cloned());
            }
        }

        Self {
            agent: AGENT_NAME.to_string(),
            run_id: uuid::Uuid::new_v4(),
            date,
            generated_at: chrono::Utc::now(),
            buy,
            sell,
            hold,
            signals: outcome.analyses.into_iter().map(|a| a.signal).collect(),
            skipped: outcome.skipped,
            news,
            insider_activity,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{
        Confidence, FundamentalsSnapshot, InsiderRecord, InsiderSummary, SentimentResult, Signal,
        TickerAnalysis, TransactionType,
    };

    pub(crate) fn signal(symbol: &str, kind: SignalKind, confidence: Confidence, score: f64) -> Signal {
        let ticker = Ticker::parse(symbol).unwrap();
        Signal {
            insider_data: InsiderSummary::no_data(ticker.clone()),
            ticker,
            signal: kind,
            confidence,
            score,
            price_change_pct: Some(1.23),
            news_analysis: SentimentResult::neutral("Quiet week."),
            insider_analysis: SentimentResult::neutral("No significant insider activity"),
            fundamentals: FundamentalsSnapshot::default(),
        }
    }

    fn analysis(sig: Signal) -> TickerAnalysis {
        let headline = format!("{} headline", sig.ticker);
        TickerAnalysis {
            signal: sig,
            headlines: vec![headline],
            generated_at: chrono::Utc::now(),
        }
    }

    fn with_notable_trade(mut sig: Signal) -> Signal {
        let record = InsiderRecord {
            insider_name: "Jane Doe".to_string(),
            relationship: "Director".to_string(),
            transaction_date: "2026-01-05".to_string(),
            transaction_type: TransactionType::Sale,
            shares: 20000.0,
            price_per_share: 10.0,
            total_value: 200000.0,
            filed_date: "2026-01-06".to_string(),
            acquired_disposed: "D".to_string(),
        };
        sig.insider_data = InsiderSummary::from_records(sig.ticker.clone(), &[record]);
        sig
    }

    #[test]
    fn partitions_tickers_and_picks_top_movers() {
        let outcome = RunOutcome {
            analyses: vec![
                analysis(signal("AAA", SignalKind::Buy, Confidence::High, 0.6)),
                analysis(signal("BBB", SignalKind::Hold, Confidence::Neutral, 0.0)),
                analysis(signal("CCC", SignalKind::Buy, Confidence::Low, 0.3)),
                analysis(signal("DDD", SignalKind::Buy, Confidence::Low, 0.25)),
                analysis(with_notable_trade(signal(
                    "EEE",
                    SignalKind::Sell,
                    Confidence::High,
                    -0.6,
                ))),
            ],
            skipped: vec!["BAD".to_string()],
        };
        let date = NaiveDate::from_ymd_opt(2026, 1, 28).unwrap();
        let report = Report::assemble(date, outcome);

        let names = |v: &[Ticker]| v.iter().map(|t| t.to_string()).collect::<Vec<_>>();
        assert_eq!(names(&report.buy), vec!["AAA", "CCC", "DDD"]);
        assert_eq!(names(&report.sell), vec!["EEE"]);
        assert_eq!(names(&report.hold), vec!["BBB"]);
        assert_eq!(report.signals.len(), 5);
        assert_eq!(report.skipped, vec!["BAD".to_string()]);
        assert_eq!(report.agent, "DST");
        assert_eq!(report.date, date);

        let news_keys: Vec<String> = report.news.iter().map(|n| n.ticker.to_string()).collect();
        assert_eq!(news_keys, vec!["AAA", "CCC", "EEE"]);
        assert_eq!(report.news[0].headlines, vec!["AAA headline".to_string()]);

        assert_eq!(report.insider_activity.len(), 1);
        assert!(report.insider_activity[0].starts_with("Jane Doe (Director) - EEE Sale"));
    }

    #[test]
    fn news_keeps_top_mover_order() {
        let outcome = RunOutcome {
            analyses: vec![
                analysis(signal("MMM", SignalKind::Sell, Confidence::Low, -0.3)),
                analysis(signal("ZZZ", SignalKind::Buy, Confidence::Low, 0.3)),
                analysis(signal("BBB", SignalKind::Sell, Confidence::High, -0.7)),
                analysis(signal("AAA", SignalKind::Buy, Confidence::High, 0.6)),
            ],
            skipped: Vec::new(),
        };
        let report = Report::assemble(NaiveDate::from_ymd_opt(2026, 1, 28).unwrap(), outcome);

        let news_keys: Vec<String> = report.news.iter().map(|n| n.ticker.to_string()).collect();
        assert_eq!(news_keys, vec!["ZZZ", "AAA", "MMM", "BBB"]);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["news"][0]["ticker"], "ZZZ");
        assert_eq!(json["news"][3]["ticker"], "BBB");
        let back: Report = serde_json::from_value(json).unwrap();
        assert_eq!(back.news, report.news);
    }

    #[test]
    fn empty_run_still_produces_a_report() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 28).unwrap();
        let report = Report::assemble(
            date,
            RunOutcome {
                analyses: Vec::new(),
                skipped: vec!["AAPL".to_string()],
            },
        );
        assert!(report.buy.is_empty() && report.sell.is_empty() && report.hold.is_empty());
        assert!(report.signals.is_empty());
        assert!(report.news.is_empty());
        assert_eq!(report.skipped.len(), 1);
    }
}
