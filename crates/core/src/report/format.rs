use crate::domain::{Confidence, Report, SignalKind, Ticker};

const MAX_INSIGHTS: usize = 3;
const INSIGHT_CHARS: usize = 100;

/// Renders the report as Discord markdown. The result may exceed one message; see
/// `split_message`.
pub fn format_report(report: &Report) -> String {
    let mut lines = vec![format!("📊 **DST Report — {}**", report.date)];

    lines.push(format!(
        "\n🟢 **Buy ({})**: {}",
        report.buy.len(),
        ticker_list(&report.buy)
    ));
    lines.push(format!(
        "🔴 **Sell ({})**: {}",
        report.sell.len(),
        ticker_list(&report.sell)
    ));
    lines.push(format!(
        "🟡 **Hold ({})**: {}",
        report.hold.len(),
        ticker_list(&report.hold)
    ));

    let insights: Vec<String> = report
        .signals
        .iter()
        .filter(|s| s.signal != SignalKind::Hold && s.confidence == Confidence::High)
        .filter(|s| !s.news_analysis.summary.is_empty())
        .take(MAX_INSIGHTS)
        .map(|s| {
            let head: String = s.news_analysis.summary.chars().take(INSIGHT_CHARS).collect();
            format!("• **{}**: {head}...", s.ticker)
        })
        .collect();
    if !insights.is_empty() {
        lines.push("\n🤖 **Key AI Insights:**".to_string());
        lines.extend(insights);
    }

    lines.push("\n---\n**Detailed Analysis:**".to_string());
    for s in &report.signals {
        lines.push(format!(
            "\n🔹 **{}** — {} ({})",
            s.ticker, s.signal, s.confidence
        ));
        let price = s
            .price_change_pct
            .map(format_number)
            .unwrap_or_else(|| "N/A".to_string());
        lines.push(format!(
            "• Score: {} | Δ Price: {price}%",
            format_number(s.score)
        ));

        let fundamentals = s.fundamentals.display_line();
        if !fundamentals.is_empty() {
            lines.push(format!("• Fundamentals: {fundamentals}"));
        }
        if !s.news_analysis.summary.is_empty() {
            lines.push(format!(
                "• 🤖 **News AI**: {} (Score: {})",
                s.news_analysis.summary,
                format_number(s.news_analysis.sentiment_score)
            ));
        }
        if s.insider_data.has_notable() && !s.insider_analysis.summary.is_empty() {
            lines.push(format!(
                "• 🕵️ **Insider AI**: {} (Score: {})",
                s.insider_analysis.summary,
                format_number(s.insider_analysis.sentiment_score)
            ));
        }
    }

    if !report.insider_activity.is_empty() {
        lines.push("\n---\n**Notable Insider/Senator Trades:**".to_string());
        lines.extend(report.insider_activity.iter().map(|l| format!("🔍 {l}")));
    }

    lines.join("\n")
}

fn ticker_list(tickers: &[Ticker]) -> String {
    if tickers.is_empty() {
        return "None".to_string();
    }
    tickers
        .iter()
        .map(Ticker::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Whole numbers keep one decimal (`0.0`, `-1.0`); everything else prints as-is.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
