use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard, TryLockError};

use crate::entity::Entity;
use crate::error::SceneError;
use crate::scene::Scene;

/// A behavioural unit attached to an entity.
///
/// Components are created bare by the [`ComponentRegistry`](crate::ComponentRegistry)
/// and configured exactly once by the owning scene's build pass through
/// [`Component::setup`]. A `setup` may complete immediately or suspend on
/// external work such as asset loading.
#[async_trait]
pub trait Component: Any + Send {
    /// Configure the component from its description payload.
    ///
    /// Every entity of the scene is structurally present when this runs, so
    /// `ctx.find_object` resolves anywhere in the tree. Other entities'
    /// components may not be configured yet.
    ///
    /// The component's own handle stays locked until `setup` returns. Locking
    /// it again from inside `setup`, or locking another component whose setup
    /// is waiting on this one, never completes.
    async fn setup(&mut self, ctx: &SetupContext, config: &Value) -> anyhow::Result<()> {
        let _ = (ctx, config);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn Component {
    /// Borrow the concrete component type, if it matches.
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutably borrow the concrete component type, if it matches.
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    pub fn is<T: Component>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

struct ComponentCell {
    type_name: String,
    owner: Weak<Entity>,
    configured: AtomicBool,
    component: Mutex<Box<dyn Component>>,
}

/// Shared handle to a component stamped with its type name and owner.
///
/// Cloning the handle does not clone the component; all clones refer to the
/// same instance.
#[derive(Clone)]
pub struct ComponentHandle {
    cell: Arc<ComponentCell>,
}

impl ComponentHandle {
    pub(crate) fn new(type_name: &str, owner: &Arc<Entity>, component: Box<dyn Component>) -> Self {
        Self {
            cell: Arc::new(ComponentCell {
                type_name: type_name.to_string(),
                owner: Arc::downgrade(owner),
                configured: AtomicBool::new(false),
                component: Mutex::new(component),
            }),
        }
    }

    /// The registry type name this component was created under.
    pub fn type_name(&self) -> &str {
        &self.cell.type_name
    }

    /// The entity owning this component. `None` once the entity is dropped.
    pub fn owner(&self) -> Option<Arc<Entity>> {
        self.cell.owner.upgrade()
    }

    /// Whether `setup` has completed successfully.
    pub fn is_configured(&self) -> bool {
        self.cell.configured.load(Ordering::Acquire)
    }

    /// Wait for exclusive access to the component.
    pub async fn lock(&self) -> MutexGuard<'_, Box<dyn Component>> {
        self.cell.component.lock().await
    }

    /// Non-blocking access; fails while the component is held elsewhere
    /// (for instance by its own in-flight `setup`).
    pub fn try_lock(&self) -> Result<MutexGuard<'_, Box<dyn Component>>, TryLockError> {
        self.cell.component.try_lock()
    }

    /// Whether two handles refer to the same component instance.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.cell, &b.cell)
    }

    /// Run the component's `setup`, holding it for the whole configuration.
    pub(crate) async fn setup(&self, ctx: SetupContext, config: &Value) -> Result<(), SceneError> {
        let mut component = self.cell.component.lock().await;
        component
            .setup(&ctx, config)
            .await
            .map_err(|source| SceneError::SetupFailure {
                entity: ctx.entity.name().to_string(),
                type_name: self.cell.type_name.clone(),
                source: source.into(),
            })?;
        self.cell.configured.store(true, Ordering::Release);
        Ok(())
    }
}

impl PartialEq for ComponentHandle {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl Eq for ComponentHandle {}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let owner = self.owner();
        f.debug_struct("ComponentHandle")
            .field("type_name", &self.cell.type_name)
            .field("owner", &owner.as_ref().map(|e| e.name()))
            .field("configured", &self.is_configured())
            .finish()
    }
}

/// Context handed to every [`Component::setup`] call.
///
/// Gives the component the scene under construction without going through
/// the process-wide active scene.
#[derive(Clone)]
pub struct SetupContext {
    scene: Arc<Scene>,
    entity: Arc<Entity>,
    type_name: String,
}

impl SetupContext {
    pub(crate) fn new(scene: Arc<Scene>, entity: Arc<Entity>, type_name: &str) -> Self {
        Self {
            scene,
            entity,
            type_name: type_name.to_string(),
        }
    }

    /// The scene being built.
    pub fn scene(&self) -> &Arc<Scene> {
        &self.scene
    }

    /// The entity owning the component being configured.
    pub fn entity(&self) -> &Arc<Entity> {
        &self.entity
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Look up any entity of the scene under construction by name.
    pub fn find_object(&self, name: &str) -> Result<Arc<Entity>, SceneError> {
        self.scene.find_object(name)
    }
}

impl fmt::Debug for SetupContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetupContext")
            .field("entity", &self.entity.name())
            .field("type_name", &self.type_name)
            .finish()
    }
}
