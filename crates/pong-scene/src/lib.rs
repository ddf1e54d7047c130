//! Pong Scene - entity hierarchy and scene graph
//!
//! Builds a forest of named entities from a declarative description,
//! attaches components created through a registry, runs every component's
//! asynchronous setup, and walks the finished tree for per-frame systems.

mod active;
mod component;
mod description;
mod entity;
mod error;
mod registry;
mod scene;
mod visitor;

pub use active::{active_scene, find_object};
pub use component::{Component, ComponentHandle, SetupContext};
pub use description::{EntityDescription, SceneDescription};
pub use entity::Entity;
pub use error::SceneError;
pub use registry::{ComponentFactory, ComponentRegistry};
pub use scene::{Scene, SceneState};
pub use visitor::{ComponentSystem, EntitySystem, Schedule, VisitFuture};

/// Tests that build scenes write the process-wide active slot.
#[cfg(test)]
pub(crate) fn serial() -> parking_lot::MutexGuard<'static, ()> {
    static LOCK: parking_lot::Mutex<()> = parking_lot::Mutex::new(());
    LOCK.lock()
}
