use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::stream::{self, Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, error, warn};

use crate::error::{AppError, AppResult};
use crate::extract::JsonBody;
use crate::models::{ImportJob, ImportRequest, ImportSource};
use crate::state::AppState;

const SSE_EVENT: &str = "import";

fn parse_source(source: &str) -> AppResult<ImportSource> {
    source
        .parse()
        .map_err(|_| AppError::NotFound(format!("Unknown import source: {}", source)))
}

/// POST /admin/import/:source
///
/// Opens the job synchronously so the response already carries the running
/// snapshot, then finishes the import in the background.
pub async fn start(
    State(state): State<AppState>,
    Path(source): Path<String>,
    JsonBody(request): JsonBody<ImportRequest>,
) -> AppResult<(StatusCode, Json<ImportJob>)> {
    let source = parse_source(&source)?;
    let importer = state.importer();
    let job = importer.begin(source, &request)?;

    let close_delay = state.config.close_delay;
    let tracker = state.imports.clone();
    tokio::spawn(async move {
        if let Err(e) = importer.execute(source, request).await {
            error!(source = %source, error = %e, "Import failed");
        }
        // Publish the closable/reset snapshot for stream subscribers.
        tokio::time::sleep(close_delay + Duration::from_millis(1)).await;
        tracker.snapshot();
    });

    Ok((StatusCode::ACCEPTED, Json((*job).clone())))
}

/// GET /admin/import/status
pub async fn status(State(state): State<AppState>) -> Json<ImportJob> {
    Json((*state.imports.snapshot()).clone())
}

/// POST /admin/import/dismiss
pub async fn dismiss(State(state): State<AppState>) -> AppResult<Json<ImportJob>> {
    let job = state.imports.dismiss()?;
    Ok(Json((*job).clone()))
}

/// GET /admin/import/events - current snapshot followed by every update
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("Import event stream connected");

    let rx = state.imports.subscribe();
    let initial = state.imports.snapshot();

    let first = stream::iter(
        Event::default()
            .event(SSE_EVENT)
            .json_data(&*initial)
            .ok()
            .map(Ok::<Event, Infallible>),
    );

    let updates = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(job) => match Event::default().event(SSE_EVENT).json_data(&*job) {
                Ok(event) => Some(Ok::<Event, Infallible>(event)),
                Err(e) => {
                    warn!("Failed to serialize import snapshot: {}", e);
                    None
                }
            },
            Err(e) => {
                // Lagged receivers skip ahead; the next snapshot is complete.
                warn!("Import stream error: {:?}", e);
                None
            }
        }
    });

    Sse::new(first.chain(updates)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
