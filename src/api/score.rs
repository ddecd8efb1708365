use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;

use crate::api::{parse_user_address, AppState, UserQuery};
use crate::domain::{ScoreSnapshot, ScoreTier};
use crate::engine::ScorePoint;
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub user: String,
    pub score: u32,
    pub tier: ScoreTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ScoreSnapshot>,
    pub borrowing_power: String,
    pub projection: Vec<ScorePoint>,
}

pub async fn get_score(
    Query(params): Query<UserQuery>,
    State(state): State<AppState>,
) -> Result<Json<ScoreResponse>, AppError> {
    let user = parse_user_address(&params.user)?;
    let view = state.registry.service().score(&user).await;

    Ok(Json(ScoreResponse {
        user: user.to_string(),
        score: view.score,
        tier: view.tier,
        details: view.details,
        borrowing_power: view.borrowing_power.to_canonical_string(),
        projection: view.projection,
    }))
}
