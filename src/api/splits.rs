use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{parse_user_address, AppState};
use crate::domain::{Address, Decimal};
use crate::engine::equal_shares;
use crate::error::AppError;
use crate::orchestration::{SplitOutcome, SplitShare};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareInput {
    pub debtor: String,
    pub amount: String,
}

/// Either explicit `shares`, or `total` split equally among `debtors`
/// (plus the creditor when `includeCreditor` is set).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitRequest {
    pub creditor: String,
    #[serde(default)]
    pub shares: Vec<ShareInput>,
    pub total: Option<String>,
    #[serde(default)]
    pub debtors: Vec<String>,
    #[serde(default)]
    pub include_creditor: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitFailureDto {
    pub index: usize,
    pub debtor: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitResponse {
    pub completed: usize,
    pub total: usize,
    pub tx_hashes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<SplitFailureDto>,
}

impl From<SplitOutcome> for SplitResponse {
    fn from(outcome: SplitOutcome) -> Self {
        Self {
            completed: outcome.confirmed.len(),
            total: outcome.total,
            tx_hashes: outcome.confirmed.iter().map(|h| h.to_string()).collect(),
            failure: outcome.failure.map(|f| SplitFailureDto {
                index: f.index,
                debtor: f.debtor.to_string(),
                error: f.error.to_string(),
            }),
        }
    }
}

fn parse_amount(input: &str) -> Result<Decimal, AppError> {
    Decimal::from_str_canonical(input)
        .map_err(|_| AppError::BadRequest(format!("Invalid amount: {}", input)))
}

fn build_shares(request: &SplitRequest) -> Result<Vec<SplitShare>, AppError> {
    if !request.shares.is_empty() {
        return request
            .shares
            .iter()
            .map(|s| {
                Ok(SplitShare {
                    debtor: parse_user_address(&s.debtor)?,
                    amount: parse_amount(&s.amount)?,
                })
            })
            .collect();
    }

    let total = request
        .total
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Either shares or total is required".to_string()))
        .and_then(parse_amount)?;
    let debtors: Vec<Address> = request
        .debtors
        .iter()
        .map(|d| parse_user_address(d))
        .collect::<Result<_, _>>()?;
    if debtors.is_empty() {
        return Err(AppError::BadRequest("debtors must not be empty".to_string()));
    }

    let participants = debtors.len() + usize::from(request.include_creditor);
    let amounts = equal_shares(total, participants)?;
    Ok(debtors
        .into_iter()
        .zip(amounts)
        .map(|(debtor, amount)| SplitShare { debtor, amount })
        .collect())
}

pub async fn create_split(
    State(state): State<AppState>,
    Json(request): Json<SplitRequest>,
) -> Result<(StatusCode, Json<SplitResponse>), AppError> {
    let creditor = parse_user_address(&request.creditor)?;
    let shares = build_shares(&request)?;

    let outcome = state.executor.execute(&creditor, &shares).await?;

    if !outcome.confirmed.is_empty() {
        state.registry.refresh_now(&creditor).await;
        for share in shares.iter().take(outcome.confirmed.len()) {
            state.registry.refresh_now(&share.debtor).await;
        }
    }

    let status = if outcome.failure.is_some() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };
    Ok((status, Json(SplitResponse::from(outcome))))
}
