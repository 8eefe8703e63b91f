//! Scene - item storage, buckets and the change queue
//!
//! Producers on any thread mint ids with [`Scene::allocate_id`] and submit
//! [`PendingChanges`] with [`Scene::enqueue_pending_changes`]. The render
//! thread calls [`Scene::process_pending_changes_queue`] once per frame,
//! which is the only place item storage and buckets change.
//!
//! Two locks are involved and never held together:
//! - the queue lock, held by producers for a push and by the render thread
//!   for a swap of the whole queue
//! - the storage lock, held by the render thread for the apply phase and by
//!   readers for their query window

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, trace, warn};

use super::bucket_map::ItemBucketMap;
use super::item::{Item, ItemID, ItemState};
use super::item_key::{ItemFilter, ItemKey};
use super::observer::{same_observer, ObserverPointer};
use super::pending_changes::{PendingChanges, ResetEntry};
use crate::config::{ConfigError, SceneConfig};

/// Summary of one apply phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppliedChanges {
    /// Batches drained from the queue
    pub batches: usize,
    /// Resets applied
    pub resets: usize,
    /// Removals applied
    pub removals: usize,
    /// Moves applied
    pub moves: usize,
    /// New storage length if storage grew
    pub grown_to: Option<usize>,
}

impl AppliedChanges {
    /// True when the phase had nothing to apply
    pub const fn is_empty(&self) -> bool {
        self.resets == 0 && self.removals == 0 && self.moves == 0
    }
}

/// State guarded by the storage lock
struct SceneStorage {
    items: Vec<Item>,
    buckets: ItemBucketMap,
}

impl SceneStorage {
    /// Slot for `id`, which must have been issued by the owning scene
    fn slot_mut(&mut self, id: ItemID, issued: u32) -> &mut Item {
        assert!(
            id.is_valid() && id.id() < issued && id.index() < self.items.len(),
            "item id {id} was never issued by this scene (next id {issued}, storage {})",
            self.items.len()
        );
        &mut self.items[id.index()]
    }

    fn reset_items(&mut self, resets: Vec<ResetEntry>, issued: u32) {
        for (id, payload) in resets {
            let item = self.slot_mut(id, issued);
            let was_live = item.is_live();
            let old_key = item.key();
            item.reset_payload(payload);
            let new_key = item.key();

            match (was_live, item.is_live()) {
                (true, true) => self.buckets.reset(id, &old_key, &new_key),
                (true, false) => self.buckets.erase(id, &old_key),
                (false, true) => self.buckets.insert(id, &new_key),
                (false, false) => trace!("Reset of item {id} to an empty payload while not live"),
            }
        }
    }

    fn remove_items(&mut self, ids: &[ItemID], issued: u32) {
        for &id in ids {
            let item = self.slot_mut(id, issued);
            let key = item.key();
            if item.is_live() {
                item.kill();
                self.buckets.erase(id, &key);
            } else {
                trace!("Removal of item {id} which is not live");
                item.kill();
            }
        }
    }

    fn move_items(&mut self, ids: &[ItemID], issued: u32) {
        for &id in ids {
            self.slot_mut(id, issued).apply_move();
        }
    }
}

/// Concurrent retained-mode item index
///
/// One scene per renderer session. Slot #0 is reserved and never used.
pub struct Scene {
    config: SceneConfig,

    /// Next id to hand out
    id_allocator: AtomicU32,

    /// Batches submitted since the last apply, oldest first
    change_queue: Mutex<VecDeque<PendingChanges>>,

    /// Items and buckets
    storage: Mutex<SceneStorage>,

    observers: Mutex<Vec<ObserverPointer>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Scene {
    /// Create a scene with default configuration
    pub fn new() -> Self {
        Self::build(SceneConfig::default())
    }

    /// Create a scene with custom configuration
    pub fn with_config(config: SceneConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SceneConfig) -> Self {
        let mut buckets = ItemBucketMap::with_standard_buckets();
        for filter in &config.extra_buckets {
            buckets.allocate_bucket(*filter);
        }

        let items = vec![Item::default(); config.initial_capacity.max(1)];

        debug!(
            "Scene created with {} item slots and {} buckets",
            items.len(),
            buckets.len()
        );

        Self {
            config,
            id_allocator: AtomicU32::new(ItemID::INVALID.id() + 1),
            change_queue: Mutex::new(VecDeque::new()),
            storage: Mutex::new(SceneStorage { items, buckets }),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Configuration this scene was built with
    pub const fn config(&self) -> &SceneConfig {
        &self.config
    }

    // ========================================================================
    // Producer side
    // ========================================================================

    /// Mint a new, never-reused item id
    ///
    /// Lock-free; storage grows on the next apply phase.
    ///
    /// # Panics
    ///
    /// Panics once the id space is exhausted instead of wrapping to
    /// [`ItemID::INVALID`].
    pub fn allocate_id(&self) -> ItemID {
        match self
            .id_allocator
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |next| next.checked_add(1))
        {
            Ok(id) => ItemID::new(id),
            Err(next) => panic!("item id space exhausted (next id {next})"),
        }
    }

    /// Queue a batch for the next apply phase
    pub fn enqueue_pending_changes(&self, changes: PendingChanges) {
        lock(&self.change_queue).push_back(changes);
    }

    /// Number of batches waiting for the next apply phase
    pub fn pending_batch_count(&self) -> usize {
        lock(&self.change_queue).len()
    }

    /// Number of ids issued so far
    pub fn allocated_count(&self) -> usize {
        (self.id_allocator.load(Ordering::Acquire) - 1) as usize
    }

    // ========================================================================
    // Render side
    // ========================================================================

    /// Drain the change queue and apply everything in it
    ///
    /// Call once per update tick from the render thread, before trusting
    /// bucket queries for that tick. Resets are applied first, then
    /// removals, then moves, each in submission order.
    ///
    /// # Panics
    ///
    /// Panics if a batch names an id that this scene never issued.
    pub fn process_pending_changes_queue(&self) -> AppliedChanges {
        let queue = std::mem::take(&mut *lock(&self.change_queue));

        let batches = queue.len();
        let mut consolidated = PendingChanges::new();
        consolidated.extend(queue);

        let (resets, removals, moves) = consolidated.into_parts();
        let mut applied = AppliedChanges {
            batches,
            resets: resets.len(),
            removals: removals.len(),
            moves: moves.len(),
            grown_to: None,
        };

        let mut storage = lock(&self.storage);

        // Every id in the drained batches was issued before its batch was queued
        let issued = self.id_allocator.load(Ordering::Acquire);
        let required = issued as usize;
        if required > storage.items.len() {
            let new_len = required + self.config.growth_slack;
            storage.items.resize_with(new_len, Item::default);
            debug!("Item storage grown to {new_len} slots (next id {issued})");
            applied.grown_to = Some(new_len);
        }

        storage.reset_items(resets, issued);
        storage.remove_items(&removals, issued);
        storage.move_items(&moves, issued);
        drop(storage);

        if !applied.is_empty() {
            debug!(
                "Applied {} batches: {} resets, {} removals, {} moves",
                applied.batches, applied.resets, applied.removals, applied.moves
            );
        }
        applied
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Cached key of item `id`, if its slot exists
    pub fn item_key(&self, id: ItemID) -> Option<ItemKey> {
        if !id.is_valid() {
            return None;
        }
        lock(&self.storage).items.get(id.index()).map(Item::key)
    }

    /// Lifecycle state of item `id`
    pub fn item_state(&self, id: ItemID) -> ItemState {
        if !id.is_valid() || id.id() >= self.id_allocator.load(Ordering::Acquire) {
            return ItemState::Unallocated;
        }

        match lock(&self.storage).items.get(id.index()) {
            Some(item) if item.is_live() => ItemState::Live,
            Some(item) if item.was_killed() => ItemState::Killed,
            _ => ItemState::Allocated,
        }
    }

    /// Sorted snapshot of the ids in the bucket for `filter`
    pub fn bucket_items(&self, filter: &ItemFilter) -> Option<Vec<ItemID>> {
        let storage = lock(&self.storage);
        let mut ids: Vec<ItemID> = storage.buckets.bucket(filter)?.iter().copied().collect();
        drop(storage);
        ids.sort_unstable();
        Some(ids)
    }

    /// Run `f` against the buckets while holding the storage lock
    pub fn with_buckets<R>(&self, f: impl FnOnce(&ItemBucketMap) -> R) -> R {
        f(&lock(&self.storage).buckets)
    }

    /// Run `f` against item storage while holding the storage lock
    pub fn with_items<R>(&self, f: impl FnOnce(&[Item]) -> R) -> R {
        f(&lock(&self.storage).items)
    }

    /// Number of item slots currently allocated, including slot #0
    pub fn capacity(&self) -> usize {
        lock(&self.storage).items.len()
    }

    /// Add a bucket at runtime and fill it from the live items
    ///
    /// Returns `false` if a bucket for `filter` already existed.
    pub fn allocate_bucket(&self, filter: ItemFilter) -> bool {
        let mut storage = lock(&self.storage);
        let SceneStorage { items, buckets } = &mut *storage;
        if !buckets.allocate_bucket(filter) {
            return false;
        }

        let mut filled = 0usize;
        for (index, item) in items.iter().enumerate().skip(1) {
            if item.is_live() && filter.test(&item.key()) {
                // Slot indices always fit: they come from u32 ids
                buckets.insert(ItemID::new(index as u32), &item.key());
                filled += 1;
            }
        }
        debug!("Bucket {filter:?} allocated with {filled} items");
        true
    }

    // ========================================================================
    // Observers
    // ========================================================================

    /// Attach `observer` to this scene
    ///
    /// Returns `false` without side effects if the observer is already
    /// attached to a scene, including one that claimed it concurrently.
    /// The observer's callback runs with the observer list locked.
    pub fn register_observer(self: &Arc<Self>, observer: &ObserverPointer) -> bool {
        let mut observers = lock(&self.observers);
        let listed = observers.iter().any(|o| same_observer(o, observer));
        if listed || !observer.register_scene(self) {
            warn!("Observer registration rejected: already attached to a scene");
            return false;
        }
        observers.push(Arc::clone(observer));
        info!("Observer attached ({} total)", observers.len());
        true
    }

    /// Detach `observer` from this scene
    ///
    /// Returns `false` if the observer is not attached to this scene.
    pub fn unregister_observer(&self, observer: &ObserverPointer) -> bool {
        let mut observers = lock(&self.observers);
        if !observer.unregister_scene(self) {
            return false;
        }
        observers.retain(|o| !same_observer(o, observer));
        info!("Observer detached ({} remaining)", observers.len());
        true
    }

    /// Number of attached observers
    pub fn observer_count(&self) -> usize {
        lock(&self.observers).len()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
