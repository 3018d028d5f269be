use crate::config::Settings;
use crate::ingest::provider::HttpOptions;
use crate::report::{split_message, DEFAULT_MAX_MESSAGE_CHARS};
use reqwest::StatusCode;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Delivery stopped at `part` (1-based); later parts were not sent.
#[derive(Debug, thiserror::Error)]
#[error("delivery of part {part}/{total} failed: {source}")]
pub struct DeliveryError {
    pub part: usize,
    pub total: usize,
    #[source]
    pub source: PostError,
}

/// Anything that accepts one chat message at a time.
#[async_trait::async_trait]
pub trait MessageSink: Send + Sync {
    async fn post(&self, content: &str) -> Result<(), PostError>;
}

#[derive(Debug, Clone)]
pub struct DiscordWebhook {
    http: reqwest::Client,
    url: String,
}

impl DiscordWebhook {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            http: HttpOptions::default().build_client("discord webhook")?,
            url: url.into(),
        })
    }

    /// `Ok(None)` when `DISCORD_WEBHOOK_URL` is not set.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        settings
            .discord_webhook_url
            .as_deref()
            .map(Self::new)
            .transpose()
    }
}

#[async_trait::async_trait]
impl MessageSink for DiscordWebhook {
    async fn post(&self, content: &str) -> Result<(), PostError> {
        let res = self
            .http
            .post(&self.url)
            .json(&json!({ "content": content }))
            .send()
            .await?;

        let status = res.status();
        if status == StatusCode::OK || status == StatusCode::NO_CONTENT {
            return Ok(());
        }
        let body = res.text().await.unwrap_or_default();
        Err(PostError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Splits `content` into message-sized chunks and prefixes every chunk after the first with
/// `**[Part i/n]**`.
pub fn with_part_headers(content: &str) -> Vec<String> {
    let chunks = split_message(content, DEFAULT_MAX_MESSAGE_CHARS);
    let total = chunks.len();
    if total == 1 {
        return chunks;
    }
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            if i == 0 {
                chunk
            } else {
                format!("**[Part {}/{total}]**\n\n{chunk}", i + 1)
            }
        })
        .collect()
}

/// Posts the parts in order and stops at the first failure. Returns the number of parts sent.
pub async fn deliver(sink: &dyn MessageSink, content: &str) -> Result<usize, DeliveryError> {
    let parts = with_part_headers(content);
    let total = parts.len();

    for (i, part) in parts.iter().enumerate() {
        if let Err(source) = sink.post(part).await {
            return Err(DeliveryError {
                part: i + 1,
                total,
                source,
            });
        }
        tracing::info!(part = i + 1, total, "report part delivered");
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records posts and fails from `fail_at` (1-based) onwards.
    struct RecordingSink {
        sent: Mutex<Vec<String>>,
        fail_at: Option<usize>,
    }

    impl RecordingSink {
        fn new(fail_at: Option<usize>) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_at,
            }
        }
    }

    #[async_trait::async_trait]
    impl MessageSink for RecordingSink {
        async fn post(&self, content: &str) -> Result<(), PostError> {
            let mut sent = self.sent.lock().unwrap();
            if self.fail_at == Some(sent.len() + 1) {
                return Err(PostError::Status {
                    status: 400,
                    body: "bad request".to_string(),
                });
            }
            sent.push(content.to_string());
            Ok(())
        }
    }

    fn long_report() -> String {
        (0..120)
            .map(|i| format!("🔹 **T{i}** — Hold (Neutral) {}", "-".repeat(30)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn single_part_has_no_header() {
        assert_eq!(with_part_headers("short"), vec!["short".to_string()]);
    }

    #[test]
    fn later_parts_carry_headers() {
        let parts = with_part_headers(&long_report());
        assert!(parts.len() >= 3);
        let n = parts.len();
        assert!(!parts[0].starts_with("**[Part"));
        for (i, part) in parts.iter().enumerate().skip(1) {
            assert!(part.starts_with(&format!("**[Part {}/{n}]**\n\n", i + 1)));
        }
    }

    #[tokio::test]
    async fn delivers_every_part_in_order() {
        let sink = RecordingSink::new(None);
        let sent = deliver(&sink, &long_report()).await.unwrap();
        let posted = sink.sent.lock().unwrap();
        assert_eq!(sent, posted.len());
        assert!(posted[0].starts_with("🔹 **T0**"));
    }

    #[tokio::test]
    async fn stops_at_the_first_failed_part() {
        let sink = RecordingSink::new(Some(2));
        let err = deliver(&sink, &long_report()).await.unwrap_err();
        assert_eq!(err.part, 2);
        assert!(err.total >= 3);
        assert!(matches!(err.source, PostError::Status { status: 400, .. }));
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
        assert!(err.to_string().starts_with("delivery of part 2/"));
    }
}
