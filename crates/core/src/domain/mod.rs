pub mod fundamentals;
pub mod insider;
pub mod report;
pub mod signal;
pub mod ticker;

pub use fundamentals::FundamentalsSnapshot;
pub use insider::{InsiderAvailability, InsiderRecord, InsiderSummary, TransactionType};
pub use report::{Report, TickerNews};
pub use signal::{Confidence, SentimentResult, Signal, SignalKind, TickerAnalysis};
pub use ticker::{Ticker, TickerError};
