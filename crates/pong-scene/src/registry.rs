use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::component::{Component, ComponentHandle};
use crate::entity::Entity;
use crate::error::SceneError;

/// Constructor for a bare (unconfigured) component bound to its owner.
pub type ComponentFactory = Arc<dyn Fn(&Arc<Entity>) -> Box<dyn Component> + Send + Sync>;

static GLOBAL: RwLock<Option<Arc<ComponentRegistry>>> = RwLock::new(None);

/// Maps component type names to factories.
///
/// One registry is installed process-wide (see [`ComponentRegistry::global`]);
/// entities and scenes can also be handed a private registry, which is how
/// tests substitute their own components.
pub struct ComponentRegistry {
    factories: RwLock<HashMap<String, ComponentFactory>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide registry, created empty on first use.
    pub fn global() -> Arc<Self> {
        if let Some(registry) = GLOBAL.read().as_ref() {
            return Arc::clone(registry);
        }
        let mut slot = GLOBAL.write();
        Arc::clone(slot.get_or_insert_with(|| Arc::new(Self::new())))
    }

    /// Replace the process-wide registry, returning the previous one.
    pub fn install(registry: Arc<Self>) -> Option<Arc<Self>> {
        debug!("Installing global component registry");
        GLOBAL.write().replace(registry)
    }

    /// Associate a type name with a factory. Replaces any previous factory.
    pub fn register<F>(&self, type_name: impl Into<String>, factory: F)
    where
        F: Fn(&Arc<Entity>) -> Box<dyn Component> + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        if self
            .factories
            .write()
            .insert(type_name.clone(), Arc::new(factory))
            .is_some()
        {
            warn!("Replaced component factory for '{}'", type_name);
        }
    }

    /// Register a component type that starts from its `Default` value.
    pub fn register_default<T: Component + Default>(&self, type_name: impl Into<String>) {
        self.register(type_name, |_| Box::new(T::default()));
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.factories.read().contains_key(type_name)
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Construct a bare component of `type_name` owned by `owner`.
    ///
    /// No configuration happens here; the component still needs its `setup`.
    pub fn create(&self, type_name: &str, owner: &Arc<Entity>) -> Result<ComponentHandle, SceneError> {
        // Cloned out so the factory runs without the map lock held.
        let factory = self.factories.read().get(type_name).cloned().ok_or_else(|| {
            SceneError::UnknownComponentType {
                entity: owner.name().to_string(),
                type_name: type_name.to_string(),
            }
        })?;
        let component = factory(owner);
        Ok(ComponentHandle::new(type_name, owner, component))
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
