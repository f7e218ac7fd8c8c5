use serde::{Deserialize, Serialize};

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// One recorded request to the content backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLog {
    pub id: i64,
    pub endpoint: String,
    pub action: String,
    pub item_ref: Option<String>,
    pub request_params: String,
    pub status: String,
    pub response_summary: Option<String>,
    pub duration_ms: Option<i64>,
    pub created_at: String,
}

impl ApiLog {
    pub fn is_error(&self) -> bool {
        self.status == STATUS_ERROR
    }
}

/// New API log for insertion
#[derive(Debug, Clone)]
pub struct NewApiLog {
    pub endpoint: String,
    pub action: String,
    pub item_ref: Option<String>,
    pub request_params: String,
    pub status: String,
    pub response_summary: Option<String>,
    pub duration_ms: Option<i64>,
}
