pub mod api_log;
pub mod content;
pub mod import;
pub mod job;

pub use api_log::{ApiLog, NewApiLog};
pub use content::{ContentSummary, ItemType};
pub use import::{ImportRequest, ImportResult, ImportSource, ImportedItem};
pub use job::{ImportJob, JobOutcome};
