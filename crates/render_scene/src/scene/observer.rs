//! Scene observers
//!
//! Anything that follows a scene (a render task, a debug overlay, a
//! streaming system) implements [`SceneObserver`]. The scene keeps a strong
//! handle to each attached observer and the observer keeps a weak one back.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::scene::Scene;

/// Capability interface for objects attached to a [`Scene`]
///
/// `register_scene` and `unregister_scene` are claims: each one checks and
/// updates the observer's binding in a single step and reports whether it
/// took effect. The scene relies on that to refuse an observer that another
/// scene won concurrently. Both are called with the scene's observer list
/// locked, so they must not call the observer methods of that scene.
pub trait SceneObserver: Send + Sync {
    /// Scene this observer is attached to, if any
    fn scene(&self) -> Option<Arc<Scene>>;

    /// Bind to `scene` if not bound to any scene; returns `true` on success
    fn register_scene(&self, scene: &Arc<Scene>) -> bool;

    /// Unbind if bound to exactly `scene`; returns `true` on success
    fn unregister_scene(&self, scene: &Scene) -> bool;
}

/// Shared observer handle stored by the scene
pub type ObserverPointer = Arc<dyn SceneObserver>;

/// Weak back-reference from an observer to its scene
///
/// Observer implementations can embed one and forward the three
/// [`SceneObserver`] methods to it.
#[derive(Debug, Default)]
pub struct SceneBinding {
    scene: Mutex<Weak<Scene>>,
}

impl SceneBinding {
    /// Create an unbound binding
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Weak<Scene>> {
        self.scene.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Scene currently bound, if it is still alive
    pub fn get(&self) -> Option<Arc<Scene>> {
        self.slot().upgrade()
    }

    /// Bind to `scene` unless bound to a live scene already
    ///
    /// A binding whose scene was dropped counts as unbound.
    pub fn try_bind(&self, scene: &Arc<Scene>) -> bool {
        let mut slot = self.slot();
        if slot.strong_count() > 0 {
            return false;
        }
        *slot = Arc::downgrade(scene);
        true
    }

    /// Unbind if bound to exactly `scene`
    pub fn try_unbind(&self, scene: &Scene) -> bool {
        let mut slot = self.slot();
        if !std::ptr::eq(slot.as_ptr(), scene) || slot.strong_count() == 0 {
            return false;
        }
        *slot = Weak::new();
        true
    }
}

impl SceneObserver for SceneBinding {
    fn scene(&self) -> Option<Arc<Scene>> {
        self.get()
    }

    fn register_scene(&self, scene: &Arc<Scene>) -> bool {
        self.try_bind(scene)
    }

    fn unregister_scene(&self, scene: &Scene) -> bool {
        self.try_unbind(scene)
    }
}

/// Identity comparison of two observer handles
pub(super) fn same_observer(a: &ObserverPointer, b: &ObserverPointer) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
