//! Scene management system
//!
//! Retained-mode index of everything the renderer may draw. Items are
//! identified by [`ItemID`], classified by [`ItemKey`] and grouped into
//! buckets by [`ItemFilter`].
//!
//! ## Architecture
//!
//! ```text
//! Producer threads                 Render thread
//!   allocate_id()                    process_pending_changes_queue()
//!   PendingChanges ──enqueue──▶ queue ──drain+merge──▶ apply
//!                                                       ├─ items[id].reset_payload / kill / apply_move
//!                                                       └─ buckets.reset / erase
//!                                    bucket_items(filter) ──▶ draw
//! ```

mod bucket_map;
mod item;
mod item_key;
mod observer;
mod pending_changes;
#[allow(clippy::module_inception)]
mod scene;

pub use bucket_map::{ItemBucketMap, ItemIDSet};
pub use item::{Item, ItemID, ItemState, Payload, PayloadPointer};
pub use item_key::{ItemFilter, ItemFilterBuilder, ItemKey, ItemKeyBuilder, ItemKeyFlags};
pub use observer::{ObserverPointer, SceneBinding, SceneObserver};
pub use pending_changes::PendingChanges;
pub use scene::{AppliedChanges, Scene};
