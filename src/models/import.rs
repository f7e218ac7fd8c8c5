use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, AppResult};
use crate::models::content::ItemType;

pub const MAX_IMPORT_LIMIT: u32 = 50;

/// External platform an import pulls content from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportSource {
    Wordpress,
    Youtube,
}

impl ImportSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wordpress => "wordpress",
            Self::Youtube => "youtube",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Wordpress => "WordPress",
            Self::Youtube => "YouTube",
        }
    }

    /// Item type the backend creates for this source.
    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Wordpress => ItemType::Posts,
            Self::Youtube => ItemType::Videos,
        }
    }

    /// Whether every imported item gets a follow-up transcript request.
    pub fn fetches_transcripts(&self) -> bool {
        matches!(self, Self::Youtube)
    }
}

impl fmt::Display for ImportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportSource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wordpress" => Ok(Self::Wordpress),
            "youtube" => Ok(Self::Youtube),
            _ => Err(()),
        }
    }
}

/// Body of `POST /import/{source}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    /// Site URL for WordPress, channel ID for YouTube.
    pub source_id: String,
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

impl ImportRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.source_id.trim().is_empty() {
            return Err(AppError::Validation("Source ID is required".into()));
        }
        if self.limit == 0 || self.limit > MAX_IMPORT_LIMIT {
            return Err(AppError::Validation(format!(
                "Limit must be between 1 and {}",
                MAX_IMPORT_LIMIT
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedItem {
    pub id: i64,
    pub title: String,
}

/// Response of the backend bulk-import endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub count: u32,
    pub skipped: u32,
    #[serde(default)]
    pub imported_items: Vec<ImportedItem>,
}
