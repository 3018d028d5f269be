use anyhow::Context;
use clap::Parser;
use dst_core::config::Settings;
use dst_core::delivery::{self, DiscordWebhook};
use dst_core::domain::Report;
use dst_core::pipeline::SignalAggregator;
use dst_core::report::format_report;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod watchlist;

#[derive(Debug, Parser)]
#[command(name = "dst_worker")]
struct Args {
    /// Report date (YYYY-MM-DD). Defaults to today's local date.
    #[arg(long)]
    date: Option<String>,

    /// Comma-separated tickers; overrides TICKERS_PATH.
    #[arg(long)]
    tickers: Option<String>,

    /// Run the analysis and print the report, without persisting or delivering.
    #[arg(long)]
    dry_run: bool,

    /// Persist the report but skip webhook delivery.
    #[arg(long)]
    no_deliver: bool,
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

    let args = Args::parse();

    if let Err(err) = run(&args, &settings).await {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %format!("{err:#}"), "DST run failed");
        return Err(err);
    }
    Ok(())
}

async fn run(args: &Args, settings: &Settings) -> anyhow::Result<()> {
    let date = resolve_date(args.date.as_deref())?;

    let raw = match args.tickers.as_deref() {
        Some(list) => watchlist::from_arg(list),
        None => watchlist::load_file(&settings.tickers_path).await?,
    };
    let symbols = watchlist::normalize(raw);
    tracing::info!(%date, tickers = symbols.len(), concurrency = settings.run_concurrency, "DST run starting");

    let aggregator = SignalAggregator::from_settings(settings)?;
    let outcome = aggregator.run(&symbols, settings.run_concurrency).await;
    let report = Report::assemble(date, outcome);

    tracing::info!(
        %date,
        run_id = %report.run_id,
        buy = report.buy.len(),
        sell = report.sell.len(),
        hold = report.hold.len(),
        skipped = report.skipped.len(),
        "report assembled"
    );

    if args.dry_run {
        println!("{}", format_report(&report));
        tracing::info!(%date, dry_run = true, "skipping persistence and delivery");
        return Ok(());
    }

    dst_core::storage::save_report(&settings.logs_dir, &report).await?;

    if args.no_deliver {
        tracing::info!(%date, "delivery disabled by --no-deliver");
        return Ok(());
    }

    let Some(webhook) = DiscordWebhook::from_settings(settings)? else {
        tracing::info!("DISCORD_WEBHOOK_URL not set; skipping delivery");
        return Ok(());
    };

    match delivery::deliver(&webhook, &format_report(&report)).await {
        Ok(parts) => tracing::info!(%date, parts, "report delivered"),
        Err(err) => {
            // The artifact is already on disk; a failed delivery does not fail the run.
            let err = anyhow::Error::new(err).context("report delivery failed");
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(%date, error = %format!("{err:#}"), "report delivery failed");
        }
    }
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

fn resolve_date(arg: Option<&str>) -> anyhow::Result<chrono::NaiveDate> {
    match arg {
        Some(s) => chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("--date must be YYYY-MM-DD (got {s:?})")),
        None => Ok(chrono::Local::now().date_naive()),
    }
}
