//! Deferred scene mutations
//!
//! A batch records resets, removals and moves as three independent ordered
//! lists. Nothing is validated when recording; the scene checks ids when it
//! applies the batch.

use std::fmt;

use super::item::{ItemID, PayloadPointer};

/// One recorded reset: the item and its replacement payload
pub(super) type ResetEntry = (ItemID, Option<PayloadPointer>);

/// A batch of create/update/remove/move operations for a scene
#[derive(Default, Clone)]
pub struct PendingChanges {
    reset_items: Vec<ItemID>,
    reset_payloads: Vec<Option<PayloadPointer>>,
    removed_items: Vec<ItemID>,
    moved_items: Vec<ItemID>,
}

impl PendingChanges {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `id` a new payload, publishing the item if it is not live yet
    pub fn reset_item(&mut self, id: ItemID, payload: PayloadPointer) {
        self.reset_items.push(id);
        self.reset_payloads.push(Some(payload));
    }

    /// Reset `id` to an empty payload, which kills the item when applied
    ///
    /// Unlike [`remove_item`](Self::remove_item) this is ordered with the
    /// other resets, so a later reset in the same cycle revives the item.
    pub fn clear_item(&mut self, id: ItemID) {
        self.reset_items.push(id);
        self.reset_payloads.push(None);
    }

    /// Remove `id` from the scene
    pub fn remove_item(&mut self, id: ItemID) {
        self.removed_items.push(id);
    }

    /// Notify the item `id` that it moved
    pub fn move_item(&mut self, id: ItemID) {
        self.moved_items.push(id);
    }

    /// Append every list of `other` after the matching list of `self`
    pub fn merge(&mut self, other: &Self) {
        self.reset_items.extend_from_slice(&other.reset_items);
        self.reset_payloads.extend_from_slice(&other.reset_payloads);
        self.removed_items.extend_from_slice(&other.removed_items);
        self.moved_items.extend_from_slice(&other.moved_items);
    }

    /// Same as [`merge`](Self::merge) but takes `other` by value, without cloning payloads
    pub fn append(&mut self, mut other: Self) {
        if self.is_empty() {
            *self = other;
            return;
        }
        self.reset_items.append(&mut other.reset_items);
        self.reset_payloads.append(&mut other.reset_payloads);
        self.removed_items.append(&mut other.removed_items);
        self.moved_items.append(&mut other.moved_items);
    }

    /// Reset ids paired with their payloads, in submission order
    pub fn reset_items(&self) -> impl Iterator<Item = (ItemID, Option<&PayloadPointer>)> + '_ {
        self.reset_items
            .iter()
            .copied()
            .zip(self.reset_payloads.iter().map(Option::as_ref))
    }

    /// Removed ids, in submission order
    pub fn removed_items(&self) -> &[ItemID] {
        &self.removed_items
    }

    /// Moved ids, in submission order
    pub fn moved_items(&self) -> &[ItemID] {
        &self.moved_items
    }

    /// Total number of recorded operations
    pub fn len(&self) -> usize {
        self.reset_items.len() + self.removed_items.len() + self.moved_items.len()
    }

    /// True when nothing is recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every recorded operation
    pub fn clear(&mut self) {
        self.reset_items.clear();
        self.reset_payloads.clear();
        self.removed_items.clear();
        self.moved_items.clear();
    }

    pub(super) fn into_parts(self) -> (Vec<ResetEntry>, Vec<ItemID>, Vec<ItemID>) {
        let resets = self.reset_items.into_iter().zip(self.reset_payloads).collect();
        (resets, self.removed_items, self.moved_items)
    }
}

impl Extend<PendingChanges> for PendingChanges {
    fn extend<T: IntoIterator<Item = PendingChanges>>(&mut self, iter: T) {
        for batch in iter {
            self.append(batch);
        }
    }
}

impl fmt::Debug for PendingChanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingChanges")
            .field("reset_items", &self.reset_items)
            .field("removed_items", &self.removed_items)
            .field("moved_items", &self.moved_items)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::item::Payload;
    use crate::scene::item_key::ItemKey;
    use std::sync::Arc;

    struct Shape;

    impl Payload for Shape {
        fn key(&self) -> ItemKey {
            ItemKey::opaque_shape()
        }
    }

    fn id(raw: u32) -> ItemID {
        ItemID::new(raw)
    }

    fn reset_ids(changes: &PendingChanges) -> Vec<ItemID> {
        changes.reset_items().map(|(id, _)| id).collect()
    }

    fn batch(resets: &[u32], removes: &[u32], moves: &[u32]) -> PendingChanges {
        let mut changes = PendingChanges::new();
        for &raw in resets {
            changes.reset_item(id(raw), Arc::new(Shape) as PayloadPointer);
        }
        for &raw in removes {
            changes.remove_item(id(raw));
        }
        for &raw in moves {
            changes.move_item(id(raw));
        }
        changes
    }

    #[test]
    fn test_record_operations() {
        let mut changes = PendingChanges::new();
        assert!(changes.is_empty());

        changes.reset_item(id(1), Arc::new(Shape) as PayloadPointer);
        changes.clear_item(id(2));
        changes.remove_item(id(3));
        changes.move_item(id(1));

        assert_eq!(changes.len(), 4);
        let resets: Vec<_> = changes.reset_items().map(|(id, p)| (id, p.is_some())).collect();
        assert_eq!(resets, vec![(id(1), true), (id(2), false)]);
        assert_eq!(changes.removed_items(), &[id(3)]);
        assert_eq!(changes.moved_items(), &[id(1)]);
    }

    #[test]
    fn test_merge_preserves_order_and_source() {
        let mut a = batch(&[1], &[2], &[3]);
        let b = batch(&[4, 5], &[6], &[]);

        a.merge(&b);

        assert_eq!(reset_ids(&a), vec![id(1), id(4), id(5)]);
        assert_eq!(a.removed_items(), &[id(2), id(6)]);
        assert_eq!(a.moved_items(), &[id(3)]);
        assert_eq!(b.len(), 3, "merge must not consume its argument");
    }

    #[test]
    fn test_merge_grouping_does_not_matter() {
        let a = batch(&[1], &[10], &[20]);
        let b = batch(&[2], &[11], &[]);
        let c = batch(&[3], &[], &[21]);

        let mut left = a.clone();
        left.merge(&b);
        left.merge(&c);

        let mut bc = b.clone();
        bc.merge(&c);
        let mut right = a.clone();
        right.merge(&bc);

        assert_eq!(reset_ids(&left), reset_ids(&right));
        assert_eq!(left.removed_items(), right.removed_items());
        assert_eq!(left.moved_items(), right.moved_items());
        assert_eq!(reset_ids(&left), vec![id(1), id(2), id(3)]);
    }

    #[test]
    fn test_append_matches_merge() {
        let mut merged = batch(&[1], &[2], &[]);
        let mut appended = merged.clone();
        let other = batch(&[3], &[], &[4]);

        merged.merge(&other);
        appended.append(other);

        assert_eq!(reset_ids(&merged), reset_ids(&appended));
        assert_eq!(merged.removed_items(), appended.removed_items());
        assert_eq!(merged.moved_items(), appended.moved_items());
    }

    #[test]
    fn test_extend_concatenates_in_order() {
        let mut all = PendingChanges::new();
        all.extend(vec![batch(&[1], &[], &[]), batch(&[2], &[], &[]), batch(&[3], &[], &[])]);
        assert_eq!(reset_ids(&all), vec![id(1), id(2), id(3)]);
    }

    #[test]
    fn test_clear() {
        let mut changes = batch(&[1], &[2], &[3]);
        changes.clear();
        assert!(changes.is_empty());
    }
}
