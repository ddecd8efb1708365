use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;

use crate::api::{parse_user_address, AppState, UserQuery};
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchResponse {
    pub user: String,
    pub watching: bool,
}

pub async fn list_watched(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(
        state
            .registry
            .watched()
            .await
            .iter()
            .map(|u| u.to_string())
            .collect(),
    )
}

pub async fn start_watch(
    Query(params): Query<UserQuery>,
    State(state): State<AppState>,
) -> Result<Json<WatchResponse>, AppError> {
    let user = parse_user_address(&params.user)?;
    state.registry.watch(&user).await;
    Ok(Json(WatchResponse {
        user: user.to_string(),
        watching: true,
    }))
}

/// Tear down the user's poller.
pub async fn stop_watch(
    Query(params): Query<UserQuery>,
    State(state): State<AppState>,
) -> Result<Json<WatchResponse>, AppError> {
    let user = parse_user_address(&params.user)?;
    if !state.registry.unwatch(&user).await {
        return Err(AppError::NotFound(format!("{} is not being watched", user)));
    }
    Ok(Json(WatchResponse {
        user: user.to_string(),
        watching: false,
    }))
}
