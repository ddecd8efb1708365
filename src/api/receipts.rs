use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::ReceiptData;
use crate::engine::{itemized_share, Currency};
use crate::error::AppError;
use crate::receipt::ReceiptImage;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub receipt: ReceiptData,
    /// Scanner that produced the receipt, or `demo`.
    pub source: String,
    pub total_corrected: bool,
}

/// Body is the raw image; `Content-Type` is passed on to the scanners.
pub async fn scan_receipt(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ScanResponse>, AppError> {
    if body.is_empty() {
        return Err(AppError::BadRequest("No receipt image provided".to_string()));
    }
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| v.starts_with("image/"))
        .unwrap_or("image/jpeg");

    let outcome = state
        .scanner
        .scan(&ReceiptImage::new(body.to_vec(), mime_type))
        .await;

    Ok(Json(ScanResponse {
        receipt: outcome.receipt,
        source: outcome.source.label().to_string(),
        total_corrected: outcome.total_corrected,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub receipt: ReceiptData,
    pub selected_items: Vec<usize>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub currency: String,
    pub share: String,
    pub formatted: String,
    /// Amount to record on-chain.
    pub usd: String,
}

pub async fn compute_share(
    Json(request): Json<ShareRequest>,
) -> Result<Json<ShareResponse>, AppError> {
    let currency = match request.currency.as_deref() {
        Some(code) => code
            .parse::<Currency>()
            .map_err(|e| AppError::BadRequest(format!("Invalid currency: {}", e)))?,
        None => Currency::default(),
    };

    let share = itemized_share(&request.receipt, &request.selected_items)?;

    Ok(Json(ShareResponse {
        currency: currency.code().to_string(),
        share: share.to_cents_string(),
        formatted: currency.format(share),
        usd: currency.to_usd(share).to_cents_string(),
    }))
}
