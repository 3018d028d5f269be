use crate::domain::Ticker;
use crate::ingest::provider::{send_with_retry, HttpOptions};
use crate::ingest::{FetchError, FetchOutcome, NewsSource};
use quick_xml::events::Event;
use quick_xml::Reader;

const DEFAULT_FEED_URL: &str = "https://news.google.com/rss/search";

#[derive(Debug, Clone)]
pub struct GoogleNewsClient {
    http: reqwest::Client,
    feed_url: String,
    attempts: u32,
}

impl GoogleNewsClient {
    pub fn from_env() -> anyhow::Result<Self> {
        let options = HttpOptions::from_env();
        let feed_url = std::env::var("GOOGLE_NEWS_FEED_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FEED_URL.to_string());

        Ok(Self {
            http: options.build_client("google news")?,
            feed_url,
            attempts: options.attempts,
        })
    }
}

#[async_trait::async_trait]
impl NewsSource for GoogleNewsClient {
    fn provider_name(&self) -> &'static str {
        "google_news"
    }

    async fn headlines(&self, ticker: &Ticker, limit: usize) -> FetchOutcome<Vec<String>> {
        if limit == 0 {
            return FetchOutcome::Ok(Vec::new());
        }

        let query = format!("{ticker} stock");
        let xml = match send_with_retry("google_news", self.attempts, || {
            self.http.get(&self.feed_url).query(&[
                ("q", query.as_str()),
                ("hl", "en-US"),
                ("gl", "US"),
                ("ceid", "US:en"),
            ])
        })
        .await
        {
            Ok(xml) => xml,
            Err(err) => return FetchOutcome::Degraded(err),
        };

        parse_rss_titles(&xml, limit).into()
    }
}

/// Titles of the feed's `<item>` elements in document order, at most `limit` of them.
/// The channel's own `<title>` is ignored.
pub fn parse_rss_titles(xml: &str, limit: usize) -> Result<Vec<String>, FetchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut titles = Vec::new();
    let mut in_item = false;
    let mut in_title = false;
    let mut current = String::new();

    while titles.len() < limit {
        let event = reader
            .read_event()
            .map_err(|err| FetchError::Malformed(format!("rss: {err}")))?;

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"item" => in_item = true,
                b"title" if in_item => {
                    in_title = true;
                    current.clear();
                }
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"item" => in_item = false,
                b"title" if in_title => {
                    in_title = false;
                    let title = current.trim();
                    if !title.is_empty() {
                        titles.push(title.to_string());
                    }
                }
                _ => {}
            },
            Event::Text(t) if in_title => {
                let text = t
                    .unescape()
                    .map_err(|err| FetchError::Malformed(format!("rss text: {err}")))?;
                current.push_str(&text);
            }
            Event::CData(c) if in_title => {
                current.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(titles)
}
