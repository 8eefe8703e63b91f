//! Item slots and their identifiers
//!
//! An item is the scene's view of one renderable object: a shared handle to
//! the payload plus the key last computed from it. The payload itself is
//! opaque here; the scene only ever asks it for its key.

use std::fmt;
use std::sync::Arc;

use super::item_key::ItemKey;

/// Index of an item slot in a scene
///
/// Ids are issued by [`Scene::allocate_id`](super::Scene::allocate_id) and
/// never reused. `0` is reserved as the invalid id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ItemID(u32);

impl ItemID {
    /// The reserved, never-issued id
    pub const INVALID: Self = Self(0);

    /// Wrap a raw id
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw id value
    pub const fn id(self) -> u32 {
        self.0
    }

    /// Slot index in item storage
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// False for [`ItemID::INVALID`]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ItemID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Renderable content attached to an item
///
/// Implementors are the draw-side objects (meshes, lights, backgrounds). The
/// scene only needs their current classification.
pub trait Payload: Send + Sync {
    /// Current classification of this payload
    fn key(&self) -> ItemKey;
}

/// Shared payload handle, held by the item slot and by whoever queued it
pub type PayloadPointer = Arc<dyn Payload>;

/// Lifecycle of an item slot as seen from outside the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    /// The id was never issued by this scene
    Unallocated,
    /// The id was issued but no payload has been applied yet
    Allocated,
    /// The item holds a payload; its key reflects it
    Live,
    /// The payload was released; the key is zero
    Killed,
}

/// One slot of item storage
#[derive(Default, Clone)]
pub struct Item {
    payload: Option<PayloadPointer>,
    key: ItemKey,
    killed: bool,
}

impl Item {
    /// Replace the payload and recompute the cached key
    ///
    /// An empty payload kills the item.
    pub fn reset_payload(&mut self, payload: Option<PayloadPointer>) {
        match payload {
            Some(payload) => {
                self.key = payload.key();
                self.payload = Some(payload);
                self.killed = false;
            }
            None => self.kill(),
        }
    }

    /// Release the payload and zero the key. Idempotent.
    pub fn kill(&mut self) {
        self.payload = None;
        self.key = ItemKey::default();
        self.killed = true;
    }

    /// Spatial update hook, called for every applied move
    ///
    /// Moving never changes classification, so there is no bucket work here.
    pub fn apply_move(&mut self) {}

    /// Key cached at the last reset
    pub const fn key(&self) -> ItemKey {
        self.key
    }

    /// Payload currently held, if any
    pub const fn payload(&self) -> Option<&PayloadPointer> {
        self.payload.as_ref()
    }

    /// True while the item holds a payload
    pub const fn is_live(&self) -> bool {
        self.payload.is_some()
    }

    /// True once a payload was released and not replaced since
    pub const fn was_killed(&self) -> bool {
        self.killed
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("live", &self.is_live())
            .field("key", &self.key)
            .field("killed", &self.killed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct KeyedPayload(ItemKey);

    impl Payload for KeyedPayload {
        fn key(&self) -> ItemKey {
            self.0
        }
    }

    fn payload(key: ItemKey) -> Option<PayloadPointer> {
        Some(Arc::new(KeyedPayload(key)))
    }

    #[test]
    fn test_reset_payload_caches_key() {
        let mut item = Item::default();
        assert!(!item.is_live());

        item.reset_payload(payload(ItemKey::transparent_shape()));
        assert!(item.is_live());
        assert_eq!(item.key(), ItemKey::transparent_shape());
    }

    #[test]
    fn test_reset_with_empty_payload_kills() {
        let mut item = Item::default();
        item.reset_payload(payload(ItemKey::opaque_shape()));
        item.reset_payload(None);

        assert!(!item.is_live());
        assert!(item.was_killed());
        assert!(item.key().is_empty());
    }

    #[test]
    fn test_kill_is_idempotent() {
        let mut item = Item::default();
        item.reset_payload(payload(ItemKey::light()));

        item.kill();
        let (key_once, live_once) = (item.key(), item.is_live());
        item.kill();

        assert_eq!(item.key(), key_once);
        assert_eq!(item.is_live(), live_once);
        assert!(item.was_killed());
    }

    #[test]
    fn test_payload_shared_with_producer() {
        let shared: PayloadPointer = Arc::new(KeyedPayload(ItemKey::opaque_shape()));
        let mut item = Item::default();
        item.reset_payload(Some(Arc::clone(&shared)));
        assert_eq!(Arc::strong_count(&shared), 2);

        item.kill();
        assert_eq!(Arc::strong_count(&shared), 1);
    }

    #[test]
    fn test_reset_revives_killed_item() {
        let mut item = Item::default();
        item.kill();
        item.reset_payload(payload(ItemKey::opaque_shape()));
        assert!(item.is_live());
        assert!(!item.was_killed());
    }

    #[test]
    fn test_apply_move_keeps_key() {
        let mut item = Item::default();
        item.reset_payload(payload(ItemKey::opaque_shape()));
        item.apply_move();
        assert_eq!(item.key(), ItemKey::opaque_shape());
    }

    #[test]
    fn test_item_id_validity() {
        assert!(!ItemID::INVALID.is_valid());
        assert!(ItemID::new(3).is_valid());
        assert_eq!(ItemID::new(3).index(), 3);
        assert_eq!(ItemID::new(3).to_string(), "#3");
    }
}
