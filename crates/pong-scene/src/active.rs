//! The process-wide active scene.
//!
//! Only [`Scene::build`](crate::Scene::build) writes the slot. Readers always
//! see either the previous scene or a structurally complete new one.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::entity::Entity;
use crate::error::SceneError;
use crate::scene::Scene;

static ACTIVE: RwLock<Option<Arc<Scene>>> = RwLock::new(None);

/// The currently active scene, if any build has published one.
pub fn active_scene() -> Option<Arc<Scene>> {
    ACTIVE.read().clone()
}

/// Look up an entity by name in the active scene.
pub fn find_object(name: &str) -> Result<Arc<Entity>, SceneError> {
    active_scene().ok_or(SceneError::NoActiveScene)?.find_object(name)
}

/// Publish `scene` as active, returning the scene it replaced.
pub(crate) fn activate(scene: &Arc<Scene>) -> Option<Arc<Scene>> {
    let previous = ACTIVE.write().replace(Arc::clone(scene));
    info!("Activated scene with {} root(s)", scene.roots().len());
    previous
}

/// Undo [`activate`] after a failed build. A scene activated by a later build
/// in the meantime is left alone.
pub(crate) fn rollback(failed: &Arc<Scene>, previous: Option<Arc<Scene>>) {
    let mut slot = ACTIVE.write();
    if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, failed)) {
        *slot = previous;
        info!("Restored previously active scene");
    }
}
