use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;

use crate::api::{parse_user_address, AppState, UserQuery};
use crate::domain::DebtId;
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancesResponse {
    pub user: String,
    pub owed: String,
    pub owing: String,
    pub net: String,
    /// Records left out because their individual read failed.
    pub failed_debt_ids: Vec<String>,
    pub refreshed_at: i64,
}

pub async fn get_balances(
    Query(params): Query<UserQuery>,
    State(state): State<AppState>,
) -> Result<Json<BalancesResponse>, AppError> {
    let user = parse_user_address(&params.user)?;
    let view = state.registry.view(&user).await?;

    Ok(Json(BalancesResponse {
        user: user.to_string(),
        owed: view.balance.owed.to_canonical_string(),
        owing: view.balance.owing.to_canonical_string(),
        net: view.balance.net.to_canonical_string(),
        failed_debt_ids: view.failed_ids.iter().map(DebtId::to_string).collect(),
        refreshed_at: view.refreshed_at.as_i64(),
    }))
}
