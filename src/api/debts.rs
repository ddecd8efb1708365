use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;

use crate::api::{parse_user_address, AppState, UserQuery};
use crate::domain::{DebtId, DirectedDebt};
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtDto {
    pub id: String,
    pub counterparty: String,
    pub amount: String,
    pub is_user_debtor: bool,
    pub settled: bool,
    pub created_at: i64,
}

impl From<&DirectedDebt> for DebtDto {
    fn from(debt: &DirectedDebt) -> Self {
        Self {
            id: debt.id().to_string(),
            counterparty: debt.counterparty.to_string(),
            amount: debt.amount.to_canonical_string(),
            is_user_debtor: debt.is_user_debtor,
            settled: debt.is_settled(),
            created_at: debt.record.created_at.as_i64(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtsResponse {
    pub user: String,
    pub debts: Vec<DebtDto>,
}

pub async fn get_debts(
    Query(params): Query<UserQuery>,
    State(state): State<AppState>,
) -> Result<Json<DebtsResponse>, AppError> {
    let user = parse_user_address(&params.user)?;
    let view = state.registry.view(&user).await?;

    let mut sorted: Vec<&DirectedDebt> = view.debts.iter().collect();
    sorted.sort_by_key(|d| d.id());
    let debts = sorted.into_iter().map(DebtDto::from).collect();

    Ok(Json(DebtsResponse {
        user: user.to_string(),
        debts,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    pub debt_id: String,
    pub tx_hash: String,
}

pub async fn settle_debt(
    Path(id): Path<String>,
    Query(params): Query<UserQuery>,
    State(state): State<AppState>,
) -> Result<Json<SettleResponse>, AppError> {
    let user = parse_user_address(&params.user)?;
    let id: DebtId = id.parse()?;

    let tx_hash = state.executor.settle(&user, id).await?;
    state.registry.refresh_parties(&user, id).await;

    Ok(Json(SettleResponse {
        debt_id: id.to_string(),
        tx_hash: tx_hash.to_string(),
    }))
}
