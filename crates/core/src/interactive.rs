//! Chat-facing query surface: command parsing, `$TICKER` detection and the analysis card the
//! bot renders. Nothing here talks to Discord directly.

use crate::domain::{Confidence, SignalKind, Ticker, TickerAnalysis};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

const MAX_TICKERS_PER_MESSAGE: usize = 3;
const MAX_CARD_TRADES: usize = 3;
const MAX_TRADE_CHARS: usize = 100;
const MAX_FUNDAMENTALS_CHARS: usize = 200;
const MAX_CARD_HEADLINES: usize = 3;

pub const COLOR_GREEN: u32 = 0x00ff00;
pub const COLOR_RED: u32 = 0xff0000;
pub const COLOR_YELLOW: u32 = 0xffff00;

static TICKER_MENTION: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\$([A-Z]{1,5})\b"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `$analyze <TICKER>`; `None` when the argument is missing.
    Analyze(Option<String>),
    Guide,
    Status,
}

impl Command {
    /// Recognizes `$analyze`, `$guide` and `$status` (command word case-insensitive). Anything
    /// else, including `$AAPL`, is not a command.
    pub fn parse(message: &str) -> Option<Self> {
        let rest = message.trim().strip_prefix('$')?;
        let mut words = rest.split_whitespace();
        let word = words.next()?.to_ascii_lowercase();
        match word.as_str() {
            "analyze" => Some(Self::Analyze(words.next().map(str::to_string))),
            "guide" => Some(Self::Guide),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

/// `$TICKER` mentions in the message, uppercased, deduplicated in order, at most three.
pub fn extract_tickers(message: &str) -> Vec<Ticker> {
    let re = match TICKER_MENTION.as_ref() {
        Ok(re) => re,
        Err(err) => {
            tracing::error!(error = %err, "ticker pattern failed to compile");
            return Vec::new();
        }
    };

    let upper = message.to_uppercase();
    let mut out: Vec<Ticker> = Vec::new();
    for caps in re.captures_iter(&upper) {
        let Some(ticker) = caps.get(1).and_then(|m| Ticker::parse(m.as_str()).ok()) else {
            continue;
        };
        if !out.contains(&ticker) {
            out.push(ticker);
        }
        if out.len() == MAX_TICKERS_PER_MESSAGE {
            break;
        }
    }
    out
}

pub fn failure_message(ticker: &str) -> String {
    format!(
        "❌ Could not analyze {}. Please check the ticker symbol.",
        ticker.trim().trim_start_matches('$').to_uppercase()
    )
}

pub const ANALYZE_USAGE: &str = "Usage: `$analyze TICKER` (for example `$analyze AAPL`)";

#[derive(Debug, Clone, PartialEq)]
pub struct CardField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Transport-neutral embed.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub title: String,
    pub description: Option<String>,
    pub color: u32,
    pub fields: Vec<CardField>,
    pub footer: Option<String>,
}

impl Card {
    fn new(title: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            description: None,
            color,
            fields: Vec::new(),
            footer: None,
        }
    }

    fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(CardField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }
}

pub fn recommendation(kind: SignalKind, confidence: Confidence) -> (String, u32) {
    match kind {
        SignalKind::Buy => (format!("🟢 **BUY** ({confidence})"), COLOR_GREEN),
        SignalKind::Sell => (format!("🔴 **SELL** ({confidence})"), COLOR_RED),
        SignalKind::Hold => ("🟡 **HOLD**".to_string(), COLOR_YELLOW),
    }
}

pub fn analysis_card(analysis: &TickerAnalysis) -> Card {
    let s = &analysis.signal;
    let (rec, color) = recommendation(s.signal, s.confidence);
    let mut card = Card::new(format!("📈 {} Analysis", s.ticker), color);
    card.description = Some(format!("**Recommendation: {rec}**"));

    let change = match s.price_change_pct {
        Some(p) => {
            let emoji = if p > 0.0 {
                "📈"
            } else if p < 0.0 {
                "📉"
            } else {
                "➡️"
            };
            format!("{emoji} {p:.2}%")
        }
        None => "➡️ N/A".to_string(),
    };
    card = card.field(
        "💰 Price Info",
        format!("**Change:** {change}\n**Score:** {:.2}", s.score),
        true,
    );

    let fundamentals = s.fundamentals.display_line();
    if !fundamentals.is_empty() {
        let clipped: String = fundamentals.chars().take(MAX_FUNDAMENTALS_CHARS).collect();
        card = card.field("🏢 Fundamentals", clipped, true);
    }

    let insider = &s.insider_data;
    let insider_emoji = match insider.recent_buys.cmp(&insider.recent_sells) {
        std::cmp::Ordering::Greater => "🟢",
        std::cmp::Ordering::Less => "🔴",
        std::cmp::Ordering::Equal => "⚪",
    };
    card = card.field(
        "🔍 Insider Activity",
        format!(
            "{insider_emoji} Buys: {} | Sells: {}\n**Last Activity:** {}",
            insider.recent_buys,
            insider.recent_sells,
            insider.last_activity_display()
        ),
        false,
    );

    if insider.has_notable() {
        let trades = insider
            .notable
            .iter()
            .take(MAX_CARD_TRADES)
            .map(|t| format!("• {}", clip(t, MAX_TRADE_CHARS)))
            .collect::<Vec<_>>()
            .join("\n");
        card = card.field("📋 Recent Notable Trades", trades, false);
    }

    let news_score = s.news_analysis.sentiment_score;
    let news_emoji = if news_score > 0.1 {
        "🟢"
    } else if news_score < -0.1 {
        "🔴"
    } else {
        "🟡"
    };
    card = card.field(
        "📰 News Sentiment",
        format!("{news_emoji} Score: {news_score:.2}"),
        true,
    );

    if !analysis.headlines.is_empty() {
        let headlines = analysis
            .headlines
            .iter()
            .take(MAX_CARD_HEADLINES)
            .map(|h| format!("• {h}"))
            .collect::<Vec<_>>()
            .join("\n");
        card = card.field("🗞️ Headlines", headlines, false);
    }

    card.footer = Some(format!(
        "Analysis generated at {}",
        analysis.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    card
}

pub fn guide_card() -> Card {
    let mut card = Card::new("📈 Trading Analysis Bot Help", COLOR_GREEN)
        .field(
            "💡 How to Use",
            "Simply type any ticker with a $ symbol:\n• `$AAPL` - Analyze Apple\n• `$TSLA` - Analyze Tesla\n• `$NVDA` - Analyze NVIDIA",
            false,
        )
        .field(
            "🔧 Commands",
            "• `$analyze TICKER` - Force analysis of a ticker\n• `$guide` - Show this help message\n• `$status` - Check bot status",
            false,
        )
        .field(
            "📊 Analysis Includes",
            "• Daily price change\n• Insider trading activity\n• News sentiment\n• BUY/HOLD/SELL recommendation",
            false,
        );
    card.description = Some("Get on-demand stock analysis and recommendations!".to_string());
    card
}

pub fn status_card(uptime: Duration, analyses_served: u64) -> Card {
    Card::new("🤖 Bot Status", COLOR_GREEN)
        .field("Status", "✅ Online", true)
        .field("Uptime", format_uptime(uptime), true)
        .field("Analyses", analyses_served.to_string(), true)
}

fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let (days, hours, minutes) = (secs / 86_400, (secs % 86_400) / 3600, (secs % 3600) / 60);
    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m {}s", secs % 60)
    }
}

fn clip(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push_str("...");
    out
}
