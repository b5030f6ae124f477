//! HTTP surface of the dashboard backend

pub mod admin;
pub mod auth;
pub mod error;
pub mod prices;
pub mod reports;
pub mod session;

use crate::core::config::AppConfig;
use crate::core::{
    FlowRunner, IndexAggregator, PriceRefresher, PriceSource, ReportGenerator, TokenVerifier,
};
use crate::providers::genai::HttpFlowClient;
use crate::providers::record_store::StorePriceSource;
use crate::providers::session_token::HmacTokenVerifier;
use crate::store::open_report_store;
use anyhow::Result;
use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use session::CookieSettings;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Shared, immutable handles every handler works from.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn PriceSource>,
    pub aggregator: Arc<IndexAggregator>,
    pub refresher: Arc<PriceRefresher>,
    pub reports: Arc<ReportGenerator>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub cookies: CookieSettings,
}

impl AppState {
    /// Wires the HTTP-backed adapters described by the configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let source: Arc<dyn PriceSource> = Arc::new(StorePriceSource::from_config(&config.store));
        let flows: Arc<dyn FlowRunner> = Arc::new(HttpFlowClient::from_config(&config.ai));
        let aggregator = IndexAggregator::with_weights(&config.index.weights);
        let store = open_report_store(&config.reports)?;

        Ok(AppState {
            source: Arc::clone(&source),
            aggregator: Arc::new(aggregator.clone()),
            refresher: Arc::new(PriceRefresher::new(
                Arc::clone(&flows),
                config.ai.update_prices_flow.clone(),
            )),
            reports: Arc::new(ReportGenerator::new(
                source,
                flows,
                aggregator,
                store,
                config.ai.report_flow.clone(),
            )),
            verifier: Arc::new(HmacTokenVerifier::new(&config.auth.secret)?),
            cookies: CookieSettings {
                secure: config.is_production(),
                max_age_secs: config.auth.session_max_age_secs,
            },
        })
    }
}

pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let router = Router::new()
        .route("/api/commodity-prices", get(prices::commodity_prices))
        .route("/api/cotacoes", get(prices::commodity_prices))
        .route("/api/ucs-index", get(prices::ucs_index))
        .route("/api/update-prices", post(prices::update_prices))
        .route("/api/migrate-data", post(admin::migrate_data))
        .route("/api/webhook/reorganize", post(admin::reorganize_webhook))
        .route("/api/auth/verify", get(auth::verify))
        .route("/api/auth/session", post(auth::create_session))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/forgot-password", post(auth::forgot_password))
        .route(
            "/api/reports",
            get(reports::list_reports).post(reports::create_report),
        )
        .route("/api/reports/:id", get(reports::get_report))
        .route("/healthz", get(admin::healthz))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    match cors_layer(cors_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    if allowed.is_empty() {
        return None;
    }
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([CONTENT_TYPE, AUTHORIZATION])
            .allow_credentials(true),
    )
}
