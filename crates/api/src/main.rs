use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shelltrack_core::catalog::Catalog;
use shelltrack_core::config::MarketOptions;
use shelltrack_core::domain::{Item, PriceAnalysis};
use shelltrack_core::market::{self, ItemPrediction, MarketEntry, UserPricing};
use shelltrack_core::PricingError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = shelltrack_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let catalog = Catalog::load(settings.catalog_path.as_deref())?;
    let options = MarketOptions::from_env();
    tracing::info!(
        items = catalog.items().len(),
        catalog_path = settings.catalog_path.as_deref().unwrap_or("<builtin>"),
        ?options,
        "catalog loaded"
    );

    let state = AppState {
        catalog: Arc::new(catalog),
        options: Arc::new(options),
    };

    let app = router(state).layer(TraceLayer::new_for_http());

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

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/items", get(list_items))
        .route("/market/global", get(get_global_market))
        .route("/users/:user_id/pricing", get(get_user_pricing))
        .route(
            "/users/:user_id/items/:item_id/prediction",
            get(get_item_prediction),
        )
        .route(
            "/users/:user_id/items/:item_id/analysis",
            get(get_item_analysis),
        )
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Clone)]
struct AppState {
    catalog: Arc<Catalog>,
    options: Arc<MarketOptions>,
}

#[derive(Debug, Deserialize)]
struct PredictionParams {
    hours_ahead: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct AnalysisParams {
    observed_price: u64,
}

async fn list_items(State(state): State<AppState>) -> Json<Vec<Item>> {
    Json(state.catalog.items().to_vec())
}

async fn get_user_pricing(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserPricing>, StatusCode> {
    market::user_pricing(&state.catalog, &user_id, &state.options, Utc::now())
        .map(Json)
        .map_err(pricing_status)
}

async fn get_item_prediction(
    State(state): State<AppState>,
    Path((user_id, item_id)): Path<(String, String)>,
    Query(params): Query<PredictionParams>,
) -> Result<Json<ItemPrediction>, StatusCode> {
    let hours_ahead = params.hours_ahead.unwrap_or(state.options.hours_ahead);
    market::item_prediction(
        &state.catalog,
        &user_id,
        &item_id,
        hours_ahead,
        &state.options,
        Utc::now(),
    )
    .map(Json)
    .map_err(pricing_status)
}

async fn get_item_analysis(
    State(state): State<AppState>,
    Path((user_id, item_id)): Path<(String, String)>,
    Query(params): Query<AnalysisParams>,
) -> Result<Json<PriceAnalysis>, StatusCode> {
    let item = state.catalog.find(&item_id).map_err(pricing_status)?;
    if item.is_fixed() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    market::analyze(
        &user_id,
        &item.id,
        params.observed_price,
        state.options.bounds,
        Utc::now(),
    )
    .map(Json)
    .map_err(pricing_status)
}

async fn get_global_market(
    State(state): State<AppState>,
) -> Result<Json<Vec<MarketEntry>>, StatusCode> {
    // Hashes sample_users x hours_to_check prices per item; keep it off the async workers.
    let now = Utc::now();
    let entries = tokio::task::spawn_blocking(move || {
        market::global_market(&state.catalog, &state.options, now)
    })
    .await
    .map_err(|e| {
        let err = anyhow::Error::new(e);
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "global market task failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(pricing_status)?;

    Ok(Json(entries))
}

fn pricing_status(err: PricingError) -> StatusCode {
    match err {
        PricingError::NotFound(_) => StatusCode::NOT_FOUND,
        PricingError::InvalidInput(detail) => {
            tracing::debug!(%detail, "rejected pricing request");
            StatusCode::BAD_REQUEST
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &shelltrack_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
