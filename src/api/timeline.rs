use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::{parse_user_address, AppState};
use crate::domain::{EventKind, KindFilter, SortOrder, TimelineEvent, TimelineQuery};
use crate::engine::select;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct TimelineParams {
    pub user: String,
    pub filter: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEventDto {
    pub id: String,
    pub debt_id: String,
    pub kind: EventKind,
    pub amount: String,
    pub timestamp: i64,
    pub other_party: String,
    pub score_impact: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_time: Option<bool>,
    pub settlement_approximated: bool,
}

impl From<TimelineEvent> for TimelineEventDto {
    fn from(event: TimelineEvent) -> Self {
        Self {
            id: event.id,
            debt_id: event.debt_id.to_string(),
            kind: event.kind,
            amount: event.amount.to_canonical_string(),
            timestamp: event.timestamp.as_i64(),
            other_party: event.other_party.to_string(),
            score_impact: event.score_impact,
            on_time: event.on_time,
            settlement_approximated: event.settlement_approximated,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineResponse {
    pub user: String,
    pub events: Vec<TimelineEventDto>,
}

fn parse_param<T: FromStr<Err = String> + Default>(
    name: &str,
    value: Option<&str>,
) -> Result<T, AppError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => T::from_str(s)
            .map_err(|e| AppError::BadRequest(format!("Invalid {}: {}", name, e))),
        None => Ok(T::default()),
    }
}

pub async fn get_timeline(
    Query(params): Query<TimelineParams>,
    State(state): State<AppState>,
) -> Result<Json<TimelineResponse>, AppError> {
    let user = parse_user_address(&params.user)?;
    let query = TimelineQuery {
        filter: parse_param::<KindFilter>("filter", params.filter.as_deref())?,
        search: params.search.unwrap_or_default(),
        sort: parse_param::<SortOrder>("sort", params.sort.as_deref())?,
    };

    let view = state.registry.view(&user).await?;
    let events = select(&view.timeline, &query)
        .into_iter()
        .map(TimelineEventDto::from)
        .collect();

    Ok(Json(TimelineResponse {
        user: user.to_string(),
        events,
    }))
}
