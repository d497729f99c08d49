//! NFL Odds Ingestion Service
//!
//! Thin HTTP wrapper around the week pipeline: one endpoint that returns a
//! week's merged odds table as CSV, plus a health probe. Callers doing a
//! multi-season backfill hit the week endpoint once per slate with their
//! own inter-request delay; a failed week is theirs to skip or retry.

use std::future::IntoFuture;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{error, info};

use nfl_odds_ingestion::config::Config;
use nfl_odds_ingestion::error::IngestError;
use nfl_odds_ingestion::pipeline::OddsPipeline;

/// Service health state
#[derive(Clone)]
struct HealthState {
    last_run_time: Arc<RwLock<Option<DateTime<Utc>>>>,
    last_row_count: Arc<RwLock<usize>>,
    error_count: Arc<RwLock<usize>>,
}

impl HealthState {
    fn new() -> Self {
        Self {
            last_run_time: Arc::new(RwLock::new(None)),
            last_row_count: Arc::new(RwLock::new(0)),
            error_count: Arc::new(RwLock::new(0)),
        }
    }

    async fn record_success(&self, rows: usize) {
        *self.last_run_time.write().await = Some(Utc::now());
        *self.last_row_count.write().await = rows;
        *self.error_count.write().await = 0;
    }

    async fn record_error(&self) {
        *self.error_count.write().await += 1;
    }
}

#[derive(Clone)]
struct AppState {
    pipeline: Arc<OddsPipeline>,
    health: HealthState,
}

/// Run the pipeline for one week and return the table as CSV.
async fn odds_handler(
    State(state): State<AppState>,
    Path((season, week)): Path<(u16, u8)>,
) -> std::result::Result<impl IntoResponse, IngestError> {
    match state.pipeline.run_week(season, week).await {
        Ok(table) => {
            state.health.record_success(table.rows.len()).await;
            Ok((
                [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
                table.to_csv(),
            ))
        }
        Err(e) => {
            state.health.record_error().await;
            error!("week request failed for season {season} week {week}: {e}");
            Err(e)
        }
    }
}

/// Health check handler
async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let last_run = state.health.last_run_time.read().await;
    let last_rows = state.health.last_row_count.read().await;
    let errors = state.health.error_count.read().await;

    let status = if *errors > 5 { "degraded" } else { "ok" };
    let http_status = if *errors > 10 {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        http_status,
        Json(json!({
            "service": "nfl-odds-ingestion",
            "version": env!("CARGO_PKG_VERSION"),
            "status": status,
            "last_run": last_run.map(|t| t.to_rfc3339()),
            "last_row_count": *last_rows,
            "consecutive_errors": *errors
        })),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nfl_odds_ingestion=info".parse().unwrap()),
        )
        .init();

    info!("NFL Odds Ingestion Service v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let health_port = config.health_port;
    let run_once = config.run_once;

    let pipeline = OddsPipeline::new(config)?;

    // One-shot mode: build a single week's table, write CSV to stdout, exit.
    if run_once {
        let season: u16 = std::env::var("SEASON")
            .context("SEASON must be set when RUN_ONCE=true")?
            .parse()
            .context("SEASON must be a year")?;
        let week: u8 = std::env::var("WEEK")
            .context("WEEK must be set when RUN_ONCE=true")?
            .parse()
            .context("WEEK must be a week number")?;

        info!("Running in one-shot mode for season {season} week {week}");
        let table = pipeline.run_week(season, week).await?;
        info!(
            "One-shot run completed for week {:?}: {} rows, {} unmatched listing rows",
            table.slate.label,
            table.rows.len(),
            table.report.unmatched_meta
        );
        print!("{}", table.to_csv());
        return Ok(());
    }

    let state = AppState {
        pipeline: Arc::new(pipeline),
        health: HealthState::new(),
    };

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/odds/:season/:week", get(odds_handler))
        .with_state(state);

    let addr = format!("0.0.0.0:{health_port}");
    info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            result.context("server error")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down...");
        }
    }

    Ok(())
}
