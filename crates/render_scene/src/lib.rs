//! # Render Scene
//!
//! Retained-mode item index for a real-time renderer. Gameplay, streaming and
//! loader threads describe what should change; the render thread applies those
//! changes once per frame and then draws from category buckets.
//!
//! ## Features
//!
//! - **Lock-light producers**: ids come from an atomic counter, change batches
//!   go into a short-lived queue lock
//! - **Single apply point**: all queued batches are merged and applied under
//!   one storage lock per frame
//! - **Bucketed queries**: items are indexed by [`ItemFilter`] so the opaque
//!   and transparent passes never scan the whole scene
//! - **Observers**: anything that wants to follow a scene attaches through the
//!   small [`SceneObserver`] capability trait
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use render_scene::prelude::*;
//!
//! struct Teapot;
//!
//! impl Payload for Teapot {
//!     fn key(&self) -> ItemKey {
//!         ItemKey::opaque_shape()
//!     }
//! }
//!
//! let scene = Scene::new();
//! let id = scene.allocate_id();
//!
//! let mut changes = PendingChanges::new();
//! changes.reset_item(id, Arc::new(Teapot) as PayloadPointer);
//! scene.enqueue_pending_changes(changes);
//!
//! scene.process_pending_changes_queue();
//! assert_eq!(scene.bucket_items(&ItemFilter::opaque_shape()), Some(vec![id]));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod config;
pub mod foundation;
pub mod scene;

pub use config::{Config, ConfigError, SceneConfig};
pub use scene::{
    AppliedChanges, Item, ItemBucketMap, ItemFilter, ItemFilterBuilder, ItemID, ItemIDSet,
    ItemKey, ItemKeyBuilder, ItemKeyFlags, ItemState, ObserverPointer, Payload, PayloadPointer,
    PendingChanges, Scene, SceneBinding, SceneObserver,
};

/// Common imports for scene users
pub mod prelude {
    pub use crate::{
        config::{Config, SceneConfig},
        scene::{
            ItemFilter, ItemID, ItemKey, ItemState, ObserverPointer, Payload, PayloadPointer,
            PendingChanges, Scene, SceneBinding, SceneObserver,
        },
    };
}
