//! Filter-keyed item buckets
//!
//! Each bucket holds the ids of the items whose key passes its filter.
//! Buckets overlap freely; an item can sit in any number of them. All
//! operations touch one item and cost one filter test per bucket.

use std::collections::hash_map;
use std::collections::{HashMap, HashSet};

use super::item::ItemID;
use super::item_key::{ItemFilter, ItemKey};

/// Set of item ids in one bucket
pub type ItemIDSet = HashSet<ItemID>;

/// Mapping from filter to the ids that currently pass it
#[derive(Debug, Default, Clone)]
pub struct ItemBucketMap {
    buckets: HashMap<ItemFilter, ItemIDSet>,
}

impl ItemBucketMap {
    /// Create a map with no buckets
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a map holding the opaque and transparent shape buckets
    pub fn with_standard_buckets() -> Self {
        let mut map = Self::new();
        map.allocate_standard_opaque_transparent_buckets();
        map
    }

    /// Ensure the opaque-shape and transparent-shape buckets exist
    pub fn allocate_standard_opaque_transparent_buckets(&mut self) {
        self.allocate_bucket(ItemFilter::opaque_shape());
        self.allocate_bucket(ItemFilter::transparent_shape());
    }

    /// Ensure a bucket exists for `filter`
    ///
    /// Returns `true` if the bucket was created. A new bucket starts empty;
    /// items already in the scene are not back-filled.
    pub fn allocate_bucket(&mut self, filter: ItemFilter) -> bool {
        match self.buckets.entry(filter) {
            hash_map::Entry::Occupied(_) => false,
            hash_map::Entry::Vacant(slot) => {
                slot.insert(ItemIDSet::new());
                true
            }
        }
    }

    /// Add `id` to every bucket whose filter accepts `key`
    pub fn insert(&mut self, id: ItemID, key: &ItemKey) {
        for (filter, bucket) in &mut self.buckets {
            if filter.test(key) {
                bucket.insert(id);
            }
        }
    }

    /// Remove `id` from every bucket whose filter accepts `key`
    pub fn erase(&mut self, id: ItemID, key: &ItemKey) {
        for (filter, bucket) in &mut self.buckets {
            if filter.test(key) {
                bucket.remove(&id);
            }
        }
    }

    /// Move `id` between buckets after its key changed from `old_key` to `new_key`
    ///
    /// Only buckets where the two keys test differently are touched.
    pub fn reset(&mut self, id: ItemID, old_key: &ItemKey, new_key: &ItemKey) {
        for (filter, bucket) in &mut self.buckets {
            match (filter.test(old_key), filter.test(new_key)) {
                (true, false) => {
                    bucket.remove(&id);
                }
                (false, true) => {
                    bucket.insert(id);
                }
                _ => {}
            }
        }
    }

    /// Ids in the bucket for `filter`, if that bucket exists
    pub fn bucket(&self, filter: &ItemFilter) -> Option<&ItemIDSet> {
        self.buckets.get(filter)
    }

    /// True if the bucket for `filter` exists and holds `id`
    pub fn contains(&self, filter: &ItemFilter, id: ItemID) -> bool {
        self.buckets
            .get(filter)
            .is_some_and(|bucket| bucket.contains(&id))
    }

    /// Filters of all allocated buckets
    pub fn filters(&self) -> impl Iterator<Item = &ItemFilter> {
        self.buckets.keys()
    }

    /// All buckets with their filters
    pub fn iter(&self) -> impl Iterator<Item = (&ItemFilter, &ItemIDSet)> {
        self.buckets.iter()
    }

    /// Number of buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// True when no bucket is allocated
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
