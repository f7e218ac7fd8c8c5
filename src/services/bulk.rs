use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::ListingCache;
use crate::error::{AppError, AppResult};
use crate::models::ItemType;
use crate::selection::SelectionStore;
use crate::services::backend_client::BackendClient;

/// A single change applied to every selected item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkAction {
    SetCategory(String),
    SetStatus(String),
    Delete,
}

impl BulkAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SetCategory(_) => "set_category",
            Self::SetStatus(_) => "set_status",
            Self::Delete => "delete",
        }
    }
}

/// Applies bulk changes through the backend. A change succeeds or fails as
/// a whole; only success clears the selection and the cached listing.
#[derive(Clone)]
pub struct BulkMutator {
    backend: BackendClient,
    cache: Arc<ListingCache>,
    selections: Arc<SelectionStore>,
}

impl BulkMutator {
    pub fn new(
        backend: BackendClient,
        cache: Arc<ListingCache>,
        selections: Arc<SelectionStore>,
    ) -> Self {
        Self {
            backend,
            cache,
            selections,
        }
    }

    pub async fn set_category(
        &self,
        item_type: ItemType,
        ids: &[i64],
        category_id: &str,
    ) -> AppResult<usize> {
        self.apply(item_type, ids, BulkAction::SetCategory(category_id.to_string()))
            .await
    }

    pub async fn set_status(&self, item_type: ItemType, ids: &[i64], status: &str) -> AppResult<usize> {
        self.apply(item_type, ids, BulkAction::SetStatus(status.to_string()))
            .await
    }

    pub async fn delete(&self, item_type: ItemType, ids: &[i64]) -> AppResult<usize> {
        self.apply(item_type, ids, BulkAction::Delete).await
    }

    /// Returns the number of distinct IDs sent.
    pub async fn apply(
        &self,
        item_type: ItemType,
        ids: &[i64],
        action: BulkAction,
    ) -> AppResult<usize> {
        let ids = dedup_ids(ids);
        if ids.is_empty() {
            return Err(AppError::Validation("Select at least one item".into()));
        }

        let result = match &action {
            BulkAction::SetCategory(category_id) => {
                let category_id = required(category_id, "Category")?;
                self.backend
                    .bulk_update_category(item_type, &ids, category_id)
                    .await
            }
            BulkAction::SetStatus(status) => {
                let status = required(status, "Status")?;
                self.backend
                    .bulk_update_status(item_type, &ids, status)
                    .await
            }
            BulkAction::Delete => self.backend.bulk_delete(item_type, &ids).await,
        };

        if let Err(e) = result {
            warn!(item_type = %item_type, action = action.as_str(), count = ids.len(), error = %e, "Bulk change failed");
            return Err(e);
        }

        self.selections.clear(item_type);
        self.cache.invalidate(item_type);
        info!(item_type = %item_type, action = action.as_str(), count = ids.len(), "Bulk change applied");
        Ok(ids.len())
    }
}

/// Drops repeated IDs, keeping first occurrence order.
fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

fn required<'a>(value: &'a str, field: &str) -> AppResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first_order() {
        assert_eq!(dedup_ids(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert!(dedup_ids(&[]).is_empty());
    }

    #[test]
    fn test_required_trims() {
        assert_eq!(required(" 5 ", "Category").unwrap(), "5");
        assert!(required("  ", "Category").is_err());
    }
}
