use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries::api_logs;
use crate::error::{AppError, AppResult};
use crate::models::ApiLog;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SinceQuery {
    pub since: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLogList {
    pub logs: Vec<ApiLog>,
    pub latest_log_id: i64,
    /// Rows in the whole log, not just this page.
    pub total: i64,
}

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiLogList>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let conn = state.db.get()?;
    let logs = api_logs::get_recent_logs(&conn, limit)?;
    let latest_log_id = api_logs::get_latest_log_id(&conn)?;
    let total = api_logs::count_logs(&conn)?;

    Ok(Json(ApiLogList {
        logs,
        latest_log_id,
        total,
    }))
}

pub async fn detail(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<ApiLog>> {
    let conn = state.db.get()?;
    let log = api_logs::get_log_by_id(&conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("API log {} not found", id)))?;
    Ok(Json(log))
}

/// Failed calls newer than `since`, for toast polling.
pub async fn errors_since(
    State(state): State<AppState>,
    Query(query): Query<SinceQuery>,
) -> AppResult<Json<ApiLogList>> {
    let conn = state.db.get()?;
    let logs = api_logs::get_failed_logs_since(&conn, query.since.unwrap_or(0))?;
    let latest_log_id = api_logs::get_latest_log_id(&conn)?;
    let total = api_logs::count_logs(&conn)?;

    Ok(Json(ApiLogList {
        logs,
        latest_log_id,
        total,
    }))
}
