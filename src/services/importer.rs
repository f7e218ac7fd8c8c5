use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::ListingCache;
use crate::error::AppResult;
use crate::models::{ImportJob, ImportRequest, ImportResult, ImportSource, ImportedItem};
use crate::services::backend_client::BackendClient;
use crate::services::progress::{JobUpdate, ProgressTracker};

const PROGRESS_STARTED: u8 = 5;
const PROGRESS_IMPORTED: u8 = 30;
const PROGRESS_ENRICHED: u8 = 90;
const PROGRESS_DONE: u8 = 100;

/// Totals of a finished import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: u32,
    pub skipped: u32,
    pub transcripts_fetched: u32,
    pub transcripts_failed: u32,
}

/// Runs one bulk import against the backend and reports each phase to the
/// progress tracker.
#[derive(Clone)]
pub struct Importer {
    backend: BackendClient,
    tracker: Arc<ProgressTracker>,
    cache: Arc<ListingCache>,
}

impl Importer {
    pub fn new(
        backend: BackendClient,
        tracker: Arc<ProgressTracker>,
        cache: Arc<ListingCache>,
    ) -> Self {
        Self {
            backend,
            tracker,
            cache,
        }
    }

    /// Validate the request and open the job. Conflicts with a running
    /// import leave the existing job untouched.
    pub fn begin(&self, source: ImportSource, request: &ImportRequest) -> AppResult<Arc<ImportJob>> {
        request.validate()?;

        let job = self.tracker.begin(
            source,
            format!("Importing from {}...", source.label()),
            PROGRESS_STARTED,
            format!(
                "Starting {} import from {} (limit {})",
                source.label(),
                request.source_id,
                request.limit
            ),
        )?;
        info!(source = %source, source_id = %request.source_id, limit = request.limit, "Import started");
        Ok(job)
    }

    /// Run the remaining phases of a job opened with [`Importer::begin`].
    ///
    /// A failed bulk-import call marks the job failed and returns the error.
    /// Per-item failures are logged on the job and never stop the run.
    pub async fn execute(
        &self,
        source: ImportSource,
        request: ImportRequest,
    ) -> AppResult<ImportSummary> {
        let result = match self.backend.import(source, &request).await {
            Ok(result) => result,
            Err(e) => {
                warn!(source = %source, error = %e, "Import request failed");
                self.tracker.fail(
                    JobUpdate::new()
                        .step(format!("{} import failed", source.label()))
                        .log(format!("Error: import request failed: {}", e)),
                );
                return Err(e);
            }
        };

        self.tracker.advance(
            JobUpdate::new()
                .step(format!("Processing {} items...", result.imported_items.len()))
                .progress(PROGRESS_IMPORTED)
                .total(result.count.saturating_add(result.skipped))
                .log(format!(
                    "Backend imported {} items and skipped {}",
                    result.count, result.skipped
                )),
        );

        let mut summary = ImportSummary {
            imported: result.count,
            skipped: result.skipped,
            ..ImportSummary::default()
        };

        self.enrich(source, &result, &mut summary).await;

        self.cache.invalidate(source.item_type());
        self.tracker.succeed(
            JobUpdate::new()
                .step("Import complete")
                .progress(PROGRESS_DONE)
                .counts(result.count, result.skipped)
                .log(completion_line(source, &summary)),
        );

        info!(
            source = %source,
            imported = summary.imported,
            skipped = summary.skipped,
            transcripts_failed = summary.transcripts_failed,
            "Import finished"
        );
        Ok(summary)
    }

    /// `begin` followed by `execute`.
    pub async fn run(
        &self,
        source: ImportSource,
        request: ImportRequest,
    ) -> AppResult<ImportSummary> {
        self.begin(source, &request)?;
        self.execute(source, request).await
    }

    /// Per-item phase, one item at a time. An empty item list goes straight
    /// to the enriched mark.
    async fn enrich(&self, source: ImportSource, result: &ImportResult, summary: &mut ImportSummary) {
        let total = result.imported_items.len();

        for (index, item) in result.imported_items.iter().enumerate() {
            let position = index + 1;
            let progress = progress_after(position, total);

            if !source.fetches_transcripts() {
                self.tracker.advance(
                    JobUpdate::new()
                        .step(format!("Imported {}/{}", position, total))
                        .progress(progress)
                        .log(format!("Imported \"{}\"", item.title)),
                );
                continue;
            }

            self.tracker.advance(
                JobUpdate::new().step(format!("Fetching transcript {}/{}", position, total)),
            );
            let line = self.fetch_transcript(item, summary).await;
            self.tracker
                .advance(JobUpdate::new().progress(progress).log(line));
        }

        self.tracker
            .advance(JobUpdate::new().progress(PROGRESS_ENRICHED));
    }

    async fn fetch_transcript(&self, item: &ImportedItem, summary: &mut ImportSummary) -> String {
        match self.backend.fetch_transcript(item.id).await {
            Ok(()) => {
                summary.transcripts_fetched += 1;
                format!("Transcript fetched for \"{}\"", item.title)
            }
            Err(e) => {
                summary.transcripts_failed += 1;
                warn!(video_id = item.id, error = %e, "Transcript fetch failed");
                format!("Error fetching transcript for \"{}\": {}", item.title, e)
            }
        }
    }
}

fn progress_after(position: usize, total: usize) -> u8 {
    if total == 0 {
        return PROGRESS_ENRICHED;
    }
    let span = (PROGRESS_ENRICHED - PROGRESS_IMPORTED) as usize;
    PROGRESS_IMPORTED + (span * position / total) as u8
}

fn completion_line(source: ImportSource, summary: &ImportSummary) -> String {
    let mut line = format!(
        "Import complete: {} imported, {} skipped",
        summary.imported, summary.skipped
    );
    if source.fetches_transcripts() {
        line.push_str(&format!(
            ", {} transcripts fetched",
            summary.transcripts_fetched
        ));
        if summary.transcripts_failed > 0 {
            line.push_str(&format!(", {} failed", summary.transcripts_failed));
        }
    }
    line
}
