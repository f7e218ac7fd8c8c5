use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::Config;
use crate::db::queries::api_logs;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::api_log::{NewApiLog, STATUS_ERROR, STATUS_SUCCESS};
use crate::models::{ContentSummary, ImportRequest, ImportResult, ImportSource, ItemType};

/// Longest response body kept in an error or log summary.
const MAX_BODY_EXCERPT: usize = 500;

/// Client for the content backend's JSON API.
///
/// Every request is recorded in the `api_logs` table when an audit pool is
/// attached. Recording failures are logged and otherwise ignored.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    audit: Option<DbPool>,
}

/// Descriptor of one backend call, used for the api log row.
struct Call {
    method: Method,
    path: String,
    action: &'static str,
    item_ref: Option<String>,
    params: Value,
}

impl Call {
    fn endpoint(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BulkCategoryBody<'a> {
    ids: &'a [i64],
    category_id: &'a str,
}

#[derive(Serialize)]
struct BulkStatusBody<'a> {
    ids: &'a [i64],
    status: &'a str,
}

#[derive(Serialize)]
struct IdsBody<'a> {
    ids: &'a [i64],
}

impl BackendClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            audit: None,
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            &config.backend_url,
            config.backend_token.clone(),
            config.request_timeout,
        )
    }

    pub fn with_audit(mut self, pool: DbPool) -> Self {
        self.audit = Some(pool);
        self
    }

    /// `POST /import/{source}`
    pub async fn import(
        &self,
        source: ImportSource,
        request: &ImportRequest,
    ) -> AppResult<ImportResult> {
        let call = Call {
            method: Method::POST,
            path: format!("/import/{}", source),
            action: "bulk_import",
            item_ref: Some(request.source_id.clone()),
            params: serde_json::to_value(request).unwrap_or(Value::Null),
        };
        let builder = self.request(&call).json(request);
        self.execute_json(call, builder).await
    }

    /// `POST /videos/{id}/transcript`
    pub async fn fetch_transcript(&self, video_id: i64) -> AppResult<()> {
        let call = Call {
            method: Method::POST,
            path: format!("/{}/{}/transcript", ItemType::Videos, video_id),
            action: "fetch_transcript",
            item_ref: Some(video_id.to_string()),
            params: Value::Null,
        };
        let builder = self.request(&call);
        self.execute(call, builder).await?;
        Ok(())
    }

    /// `PATCH /{itemType}/bulk-category`
    pub async fn bulk_update_category(
        &self,
        item_type: ItemType,
        ids: &[i64],
        category_id: &str,
    ) -> AppResult<()> {
        let call = Call {
            method: Method::PATCH,
            path: format!("/{}/bulk-category", item_type),
            action: "bulk_category",
            item_ref: None,
            params: json!({ "ids": ids, "categoryId": category_id }),
        };
        let builder = self
            .request(&call)
            .json(&BulkCategoryBody { ids, category_id });
        self.execute(call, builder).await?;
        Ok(())
    }

    /// `PATCH /{itemType}/bulk-status`
    pub async fn bulk_update_status(
        &self,
        item_type: ItemType,
        ids: &[i64],
        status: &str,
    ) -> AppResult<()> {
        let call = Call {
            method: Method::PATCH,
            path: format!("/{}/bulk-status", item_type),
            action: "bulk_status",
            item_ref: None,
            params: json!({ "ids": ids, "status": status }),
        };
        let builder = self.request(&call).json(&BulkStatusBody { ids, status });
        self.execute(call, builder).await?;
        Ok(())
    }

    /// `DELETE /{itemType}`
    pub async fn bulk_delete(&self, item_type: ItemType, ids: &[i64]) -> AppResult<()> {
        let call = Call {
            method: Method::DELETE,
            path: format!("/{}", item_type),
            action: "bulk_delete",
            item_ref: None,
            params: json!({ "ids": ids }),
        };
        let builder = self.request(&call).json(&IdsBody { ids });
        self.execute(call, builder).await?;
        Ok(())
    }

    /// `GET /{itemType}`
    pub async fn list(&self, item_type: ItemType) -> AppResult<Vec<ContentSummary>> {
        let call = Call {
            method: Method::GET,
            path: format!("/{}", item_type),
            action: "list",
            item_ref: None,
            params: Value::Null,
        };
        let builder = self.request(&call);
        self.execute_json(call, builder).await
    }

    fn request(&self, call: &Call) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, call.path);
        let builder = self.client.request(call.method.clone(), url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request whose response body is ignored.
    async fn execute(&self, call: Call, builder: RequestBuilder) -> AppResult<()> {
        let started = Instant::now();
        let outcome = send(&call, builder).await.map(|r| r.status().as_u16());
        self.record(&call, outcome.as_ref().copied(), started);
        outcome.map(|_| ())
    }

    /// Send a request and decode its JSON body. The call is logged as an
    /// error when the body does not decode.
    async fn execute_json<T: DeserializeOwned>(
        &self,
        call: Call,
        builder: RequestBuilder,
    ) -> AppResult<T> {
        let started = Instant::now();
        let outcome = match send(&call, builder).await {
            Ok(response) => {
                let status = response.status().as_u16();
                response
                    .json::<T>()
                    .await
                    .map(|body| (status, body))
                    .map_err(AppError::from)
            }
            Err(e) => Err(e),
        };
        self.record(&call, outcome.as_ref().map(|(status, _)| *status), started);
        outcome.map(|(_, body)| body)
    }

    fn record(&self, call: &Call, outcome: Result<u16, &AppError>, started: Instant) {
        let Some(pool) = &self.audit else {
            return;
        };

        let duration_ms = started.elapsed().as_millis() as i64;
        let (status, summary) = match outcome {
            Ok(code) => (STATUS_SUCCESS, format!("HTTP {}", code)),
            Err(e) => (STATUS_ERROR, excerpt(&e.to_string())),
        };

        let log = NewApiLog {
            endpoint: call.endpoint(),
            action: call.action.to_string(),
            item_ref: call.item_ref.clone(),
            request_params: call.params.to_string(),
            status: status.to_string(),
            response_summary: Some(summary),
            duration_ms: Some(duration_ms),
        };

        let result = pool
            .get()
            .map_err(AppError::from)
            .and_then(|conn| api_logs::insert_api_log(&conn, &log).map_err(AppError::from));
        if let Err(e) = result {
            warn!(endpoint = %log.endpoint, error = %e, "Failed to record backend call");
        }
    }
}

/// Send a request, turning non-2xx responses into `AppError::Backend`.
async fn send(call: &Call, builder: RequestBuilder) -> AppResult<Response> {
    debug!(endpoint = %call.endpoint(), "Sending backend request");

    let response = builder.send().await?;
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Backend {
        status,
        body: excerpt(&body),
    })
}

fn excerpt(text: &str) -> String {
    if text.len() <= MAX_BODY_EXCERPT {
        return text.to_string();
    }
    let mut end = MAX_BODY_EXCERPT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
