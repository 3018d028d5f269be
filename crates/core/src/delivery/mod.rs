pub mod webhook;

pub use webhook::{deliver, with_part_headers, DeliveryError, DiscordWebhook, MessageSink, PostError};
