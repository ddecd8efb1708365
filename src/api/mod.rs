pub mod balances;
pub mod debts;
pub mod health;
pub mod receipts;
pub mod score;
pub mod splits;
pub mod timeline;
pub mod watch;

use crate::domain::Address;
use crate::error::AppError;
use crate::orchestration::{PollerRegistry, SplitExecutor};
use crate::receipt::ScanChain;
use axum::{
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub registry: PollerRegistry,
    pub executor: SplitExecutor,
    pub scanner: Arc<ScanChain>,
}

impl AppState {
    pub fn new(registry: PollerRegistry, executor: SplitExecutor, scanner: ScanChain) -> Self {
        Self {
            registry,
            executor,
            scanner: Arc::new(scanner),
        }
    }
}

/// `?user=0x...` on every per-user endpoint.
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user: String,
}

pub(crate) fn parse_user_address(input: &str) -> Result<Address, AppError> {
    Address::parse(input).map_err(|_| AppError::BadRequest("Invalid user address".to_string()))
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/balances", get(balances::get_balances))
        .route("/v1/debts", get(debts::get_debts))
        .route("/v1/debts/:id/settle", post(debts::settle_debt))
        .route("/v1/timeline", get(timeline::get_timeline))
        .route("/v1/score", get(score::get_score))
        .route("/v1/splits", post(splits::create_split))
        .route("/v1/receipts/scan", post(receipts::scan_receipt))
        .route("/v1/receipts/share", post(receipts::compute_share))
        .route(
            "/v1/watch",
            get(watch::list_watched)
                .put(watch::start_watch)
                .delete(watch::stop_watch),
        )
        .layer(cors)
        .with_state(state)
}
