mod embeds;

use dst_core::config::Settings;
use dst_core::domain::Ticker;
use dst_core::interactive::{self, Card, Command};
use dst_core::pipeline::SignalAggregator;
use serenity::{
    async_trait,
    model::{channel::Message, gateway::Ready, id::ChannelId},
    prelude::*,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct Handler {
    aggregator: Arc<SignalAggregator>,
    started: Instant,
    analyses: AtomicU64,
}

impl Handler {
    async fn send_card(&self, ctx: &Context, msg: &Message, card: &Card) {
        let res = msg
            .channel_id
            .send_message(&ctx.http, embeds::card_message(card))
            .await;
        report_send(msg.channel_id, "send embed", res);
    }

    async fn say(&self, ctx: &Context, msg: &Message, text: &str) {
        let res = msg.channel_id.say(&ctx.http, text).await;
        report_send(msg.channel_id, "send message", res);
    }

    /// Runs one analysis and replies with its card, or a failure notice naming the ticker.
    async fn reply_with_analysis(&self, ctx: &Context, msg: &Message, raw: &str) {
        let res = msg.channel_id.broadcast_typing(&ctx.http).await;
        report_send(msg.channel_id, "typing indicator", res);

        match self.aggregator.analyze_symbol(raw).await {
            Ok(analysis) => {
                self.analyses.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    ticker = %analysis.signal.ticker,
                    signal = %analysis.signal.signal,
                    score = analysis.signal.score,
                    "on-demand analysis served"
                );
                self.send_card(ctx, msg, &interactive::analysis_card(&analysis))
                    .await;
            }
            Err(e) => {
                tracing::warn!(ticker = %raw, error = %format!("{e:#}"), "on-demand analysis failed");
                self.say(ctx, msg, &interactive::failure_message(raw)).await;
            }
        }
    }

    async fn handle_command(&self, ctx: &Context, msg: &Message, command: Command) {
        match command {
            Command::Analyze(Some(raw)) => self.reply_with_analysis(ctx, msg, &raw).await,
            Command::Analyze(None) => self.say(ctx, msg, interactive::ANALYZE_USAGE).await,
            Command::Guide => self.send_card(ctx, msg, &interactive::guide_card()).await,
            Command::Status => {
                let card = interactive::status_card(
                    self.started.elapsed(),
                    self.analyses.load(Ordering::Relaxed),
                );
                self.send_card(ctx, msg, &card).await;
            }
        }
    }
}

/// Logs a failed Discord call. Returns whether the call succeeded.
fn report_send<T>(channel: ChannelId, action: &'static str, res: serenity::Result<T>) -> bool {
    match res {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(%channel, action, error = %e, "discord call failed");
            false
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        if let Some(command) = Command::parse(&msg.content) {
            self.handle_command(&ctx, &msg, command).await;
            return;
        }

        let tickers: Vec<Ticker> = interactive::extract_tickers(&msg.content);
        for ticker in tickers {
            self.reply_with_analysis(&ctx, &msg, ticker.as_str()).await;
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        tracing::info!(user = %ready.user.name, guilds = ready.guilds.len(), "bot connected");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let token = settings.require_discord_bot_token()?.to_string();
    let aggregator = SignalAggregator::from_settings(&settings).map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        e
    })?;

    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let handler = Handler {
        aggregator: Arc::new(aggregator),
        started: Instant::now(),
        analyses: AtomicU64::new(0),
    };

    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .await?;

    let shard_manager = client.shard_manager.clone();

    tokio::select! {
        result = client.start() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "discord client error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down bot");
        }
    }

    shard_manager.shutdown_all().await;
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
