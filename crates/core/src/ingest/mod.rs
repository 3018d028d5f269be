pub mod alpha_vantage;
pub mod error;
pub mod google_news;
pub mod provider;
pub mod sec_insider;

pub use error::{FetchError, FetchOutcome};
pub use provider::{FundamentalsSource, InsiderSource, NewsSource, PriceSource};
