use crate::models::api_log::{ApiLog, NewApiLog, STATUS_ERROR};
use rusqlite::{params, Connection, OptionalExtension, Row};

const SELECT_COLUMNS: &str = "SELECT id, endpoint, action, item_ref, request_params, status, response_summary, duration_ms, created_at
     FROM api_logs";

fn row_to_log(row: &Row<'_>) -> rusqlite::Result<ApiLog> {
    Ok(ApiLog {
        id: row.get(0)?,
        endpoint: row.get(1)?,
        action: row.get(2)?,
        item_ref: row.get(3)?,
        request_params: row.get(4)?,
        status: row.get(5)?,
        response_summary: row.get(6)?,
        duration_ms: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Insert a new API log entry
pub fn insert_api_log(conn: &Connection, log: &NewApiLog) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO api_logs (endpoint, action, item_ref, request_params, status, response_summary, duration_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            log.endpoint,
            log.action,
            log.item_ref,
            log.request_params,
            log.status,
            log.response_summary,
            log.duration_ms,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Most recent logs first
pub fn get_recent_logs(conn: &Connection, limit: i64) -> rusqlite::Result<Vec<ApiLog>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY id DESC LIMIT ?1", SELECT_COLUMNS))?;
    let logs = stmt
        .query_map([limit], row_to_log)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(logs)
}

pub fn get_log_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<ApiLog>> {
    conn.query_row(&format!("{} WHERE id = ?1", SELECT_COLUMNS), [id], row_to_log)
        .optional()
}

/// Failed logs after a given ID, oldest first (for polling)
pub fn get_failed_logs_since(conn: &Connection, since_id: i64) -> rusqlite::Result<Vec<ApiLog>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE id > ?1 AND status = ?2 ORDER BY id ASC",
        SELECT_COLUMNS
    ))?;
    let logs = stmt
        .query_map(params![since_id, STATUS_ERROR], row_to_log)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(logs)
}

pub fn get_latest_log_id(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COALESCE(MAX(id), 0) FROM api_logs", [], |row| {
        row.get(0)
    })
}

pub fn count_logs(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM api_logs", [], |row| row.get(0))
}
