use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::error::AppResult;
use crate::models::{ContentSummary, ItemType};
use crate::services::backend_client::BackendClient;

struct Slot<T> {
    inner: RwLock<Option<(u64, T)>>,
}

impl<T: Clone> Slot<T> {
    fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    fn get(&self, gen: u64) -> Option<T> {
        let guard = self.inner.read().ok()?;
        match guard.as_ref() {
            Some((stored_gen, val)) if *stored_gen == gen => Some(val.clone()),
            _ => None,
        }
    }

    fn set(&self, gen: u64, val: T) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some((gen, val));
        }
    }
}

struct Listing {
    generation: AtomicU64,
    rows: Slot<Vec<ContentSummary>>,
}

impl Listing {
    fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            rows: Slot::new(),
        }
    }
}

/// Backend listings, one generation counter per item type.
///
/// A fetch started before an invalidation is stored under the old
/// generation and is never served.
pub struct ListingCache {
    posts: Listing,
    videos: Listing,
}

impl Default for ListingCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingCache {
    pub fn new() -> Self {
        Self {
            posts: Listing::new(),
            videos: Listing::new(),
        }
    }

    fn listing(&self, item_type: ItemType) -> &Listing {
        match item_type {
            ItemType::Posts => &self.posts,
            ItemType::Videos => &self.videos,
        }
    }

    pub fn invalidate(&self, item_type: ItemType) {
        let gen = self
            .listing(item_type)
            .generation
            .fetch_add(1, Ordering::SeqCst);
        tracing::debug!(item_type = %item_type, generation = gen + 1, "Listing cache invalidated");
    }

    pub async fn load(
        &self,
        backend: &BackendClient,
        item_type: ItemType,
    ) -> AppResult<Vec<ContentSummary>> {
        let listing = self.listing(item_type);
        let gen = listing.generation.load(Ordering::SeqCst);
        if let Some(cached) = listing.rows.get(gen) {
            return Ok(cached);
        }

        let rows = backend.list(item_type).await?;
        listing.rows.set(gen, rows.clone());
        Ok(rows)
    }
}
