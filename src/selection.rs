use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::models::ItemType;

/// IDs the admin has ticked in each listing.
#[derive(Debug, Default)]
pub struct SelectionStore {
    inner: Mutex<HashMap<ItemType, BTreeSet<i64>>>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ItemType, BTreeSet<i64>>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Selected IDs in ascending order.
    pub fn get(&self, item_type: ItemType) -> Vec<i64> {
        self.lock()
            .get(&item_type)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn replace(&self, item_type: ItemType, ids: &[i64]) -> Vec<i64> {
        let mut inner = self.lock();
        let set: BTreeSet<i64> = ids.iter().copied().collect();
        let selected = set.iter().copied().collect();
        inner.insert(item_type, set);
        selected
    }

    pub fn toggle(&self, item_type: ItemType, id: i64) -> Vec<i64> {
        let mut inner = self.lock();
        let set = inner.entry(item_type).or_default();
        if !set.remove(&id) {
            set.insert(id);
        }
        set.iter().copied().collect()
    }

    pub fn clear(&self, item_type: ItemType) {
        self.lock().remove(&item_type);
    }
}
