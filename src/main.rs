//! Solar monitor headend.
//! - Loads plants, panels and seed alerts from plants.yaml (or built-in samples).
//! - Synthesizes live telemetry, history and weather per request via `plant_sim`.
//! - Exposes a REST-ish API plus a single-page dashboard for plants, alerts and panels.
//! - Optional panel-health assistant when ANTHROPIC_API_KEY is set.
//! - Env vars: see `config.rs`.
//!
//! Comments are written for Rust beginners and include small Python-ish snippets
//! to show the same idea in another language.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use anyhow::{Context, Result};
use axum::{
    Router,
    routing::{get, post},
};
use chrono::Utc;
use plant_sim::RngSource;
use tokio::sync::{Mutex, RwLock};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod alerts;
mod assistant;
mod config;
mod directory;
mod http;
mod models;
mod panels;

use crate::alerts::AlertStore;
use crate::assistant::{AnthropicClient, Assistant, LanguageModel};
use crate::config::HeadendConfig;
use crate::directory::{PlantDirectory, Seed, load_seed};
use crate::http::{
    ack_alert, add_maintenance, add_problem, alert_history, analyze_panel, ask_assistant,
    clear_transcript, create_alert, get_panel, get_plant, get_transcript, health, list_alerts,
    list_panels, list_plants, plant_history, plant_telemetry, plant_weather, settings, ui_home,
    update_panel,
};
use crate::panels::PanelRegistry;

pub(crate) type SharedAssistant = Arc<Mutex<Assistant<Box<dyn LanguageModel>>>>;

#[derive(Clone)]
pub(crate) struct AppState {
    // Plants never change after startup, so no lock is needed.
    pub(crate) directory: Arc<PlantDirectory>,
    // Mutable stores behind async RwLocks: many readers / single writer.
    // Python-ish: `alerts = AlertStore()` protected by an async lock.
    pub(crate) alerts: Arc<RwLock<AlertStore>>,
    pub(crate) panels: Arc<RwLock<PanelRegistry>>,
    // None means the assistant endpoints answer 503.
    pub(crate) assistant: Option<SharedAssistant>,
    pub(crate) config: Arc<HeadendConfig>,
    // Bumped per request so a fixed SIM_SEED still gives a reproducible sequence.
    draws: Arc<AtomicU64>,
}

impl AppState {
    pub(crate) fn new(
        seed: Seed,
        config: HeadendConfig,
        assistant: Option<Assistant<Box<dyn LanguageModel>>>,
    ) -> Self {
        Self {
            directory: Arc::new(seed.directory),
            alerts: Arc::new(RwLock::new(seed.alerts)),
            panels: Arc::new(RwLock::new(seed.panels)),
            assistant: assistant.map(|a| Arc::new(Mutex::new(a))),
            config: Arc::new(config),
            draws: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Fresh random source for one request.
    pub(crate) fn rng(&self) -> RngSource {
        match self.config.sim_seed {
            Some(seed) => {
                let n = self.draws.fetch_add(1, Ordering::Relaxed);
                RngSource::seeded(seed.wrapping_add(n))
            }
            None => RngSource::from_entropy(),
        }
    }
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ui_home))
        .route("/health", get(health))
        .route("/settings", get(settings))
        .route("/plants", get(list_plants))
        .route("/plants/{id}", get(get_plant))
        .route("/plants/{id}/telemetry", get(plant_telemetry))
        .route("/plants/{id}/history", get(plant_history))
        .route("/plants/{id}/weather", get(plant_weather))
        .route("/alerts", get(list_alerts).post(create_alert))
        .route("/alerts/history", get(alert_history))
        .route("/alerts/{id}/ack", post(ack_alert))
        .route("/panels", get(list_panels))
        .route("/panels/{id}", get(get_panel).patch(update_panel))
        .route("/panels/{id}/maintenance", post(add_maintenance))
        .route("/panels/{id}/problems", post(add_problem))
        .route("/assistant/ask", post(ask_assistant))
        .route("/assistant/analyze/{panel_id}", post(analyze_panel))
        .route(
            "/assistant/transcript",
            get(get_transcript).delete(clear_transcript),
        )
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let headers = req.headers();
                    tracing::info_span!(
                        "http_request",
                        method = %req.method(),
                        path = %req.uri().path(),
                        user_agent = ?headers.get(axum::http::header::USER_AGENT),
                        x_request_id = ?headers.get("x-request-id"),
                    )
                })
                .on_request(|req: &axum::http::Request<_>, _span: &tracing::Span| {
                    tracing::info!(
                        "incoming request method={} path={}",
                        req.method(),
                        req.uri().path()
                    );
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        tracing::info!(
                            parent: span,
                            status = %res.status(),
                            latency_ms = %latency.as_millis(),
                            "response sent"
                        );
                    },
                )
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        tracing::error!(
                            parent: span,
                            error = %error,
                            latency_ms = %latency.as_millis(),
                            "request failed"
                        );
                    },
                ),
        )
}

fn build_assistant(config: &HeadendConfig) -> Option<Assistant<Box<dyn LanguageModel>>> {
    match AnthropicClient::from_config(&config.assistant) {
        Ok(client) => {
            tracing::info!("assistant enabled model={}", client.model());
            let model: Box<dyn LanguageModel> = Box::new(client);
            Some(Assistant::new(model))
        }
        Err(err) => {
            tracing::warn!("{err}; assistant endpoints will answer 503");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Set up tracing so we get logs on stdout. Use `RUST_LOG=debug` for more detail.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = HeadendConfig::from_env().context("reading configuration")?;
    let seed = load_seed(config.plants_path.as_deref(), Utc::now()).await?;
    if seed.directory.is_empty() {
        tracing::warn!("no plants configured; every plant id will resolve to the placeholder");
    }
    tracing::info!(
        "loaded plants={} panels={}",
        seed.directory.len(),
        seed.panels.list().len()
    );
    if let Some(s) = config.sim_seed {
        tracing::info!("using fixed simulation seed {s}");
    }

    let assistant = build_assistant(&config);
    let http_addr = config.http_addr;
    let app = router(AppState::new(seed, config, assistant));

    tracing::info!("Solar monitor HTTP on http://{}", http_addr);
    axum::serve(tokio::net::TcpListener::bind(http_addr).await?, app).await?;
    Ok(())
}
