use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dst_core::domain::{Report, Signal, Ticker, TickerAnalysis};
use dst_core::pipeline::SignalAggregator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = dst_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let aggregator = match SignalAggregator::from_settings(&settings) {
        Ok(agg) => Some(Arc::new(agg)),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "aggregator setup failed; /analyze disabled");
            None
        }
    };

    let state = AppState {
        logs_dir: settings.logs_dir.clone(),
        aggregator,
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/reports/latest", get(get_latest_report))
        .route("/reports/:date", get(get_report_by_date))
        .route("/reports/:date/signals/:ticker", get(get_signal_by_date_and_ticker))
        .route("/analyze/:ticker", get(analyze_ticker))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    logs_dir: PathBuf,
    aggregator: Option<Arc<SignalAggregator>>,
}

#[derive(Debug, Serialize)]
struct ApiAnalysis {
    analysis: TickerAnalysis,
    /// Same text the chat bot renders, for clients without embeds.
    summary: String,
}

async fn get_latest_report(State(state): State<AppState>) -> Result<Json<Report>, StatusCode> {
    dst_core::storage::load_latest(&state.logs_dir)
        .await
        .map_err(internal_error)?
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn get_report_by_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<Report>, StatusCode> {
    let date = parse_date(&date)?;

    dst_core::storage::load_report(&state.logs_dir, date)
        .await
        .map_err(internal_error)?
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn get_signal_by_date_and_ticker(
    State(state): State<AppState>,
    Path((date, ticker)): Path<(String, String)>,
) -> Result<Json<Signal>, StatusCode> {
    let date = parse_date(&date)?;
    let ticker = Ticker::parse(&ticker).map_err(|_| StatusCode::BAD_REQUEST)?;

    let report = dst_core::storage::load_report(&state.logs_dir, date)
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;

    find_signal(report, &ticker)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn analyze_ticker(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<ApiAnalysis>, StatusCode> {
    let Some(aggregator) = &state.aggregator else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };
    let ticker = Ticker::parse(&ticker).map_err(|_| StatusCode::BAD_REQUEST)?;

    let analysis = aggregator.analyze(&ticker).await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::warn!(%ticker, error = %format!("{e:#}"), "on-demand analysis failed");
        StatusCode::GATEWAY_TIMEOUT
    })?;

    let card = dst_core::interactive::analysis_card(&analysis);
    let summary = card
        .description
        .iter()
        .cloned()
        .chain(card.fields.iter().map(|f| format!("{}\n{}", f.name, f.value)))
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(Json(ApiAnalysis { analysis, summary }))
}

fn find_signal(report: Report, ticker: &Ticker) -> Option<Signal> {
    report.signals.into_iter().find(|s| &s.ticker == ticker)
}

fn parse_date(s: &str) -> Result<NaiveDate, StatusCode> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| StatusCode::BAD_REQUEST)
}

fn internal_error(e: anyhow::Error) -> StatusCode {
    sentry_anyhow::capture_anyhow(&e);
    tracing::error!(error = %format!("{e:#}"), "request failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &dst_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
