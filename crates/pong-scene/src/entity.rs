use std::fmt;
use std::sync::Arc;

use indexmap::map::Entry;
use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::component::ComponentHandle;
use crate::error::SceneError;
use crate::registry::ComponentRegistry;

/// A node of the scene forest.
///
/// Owns at most one component per type name and a set of uniquely named
/// children. Both maps keep insertion order, which is the order every walk
/// and lookup follows.
pub struct Entity {
    name: String,
    registry: Arc<ComponentRegistry>,
    components: RwLock<IndexMap<String, ComponentHandle>>,
    children: RwLock<IndexMap<String, Arc<Entity>>>,
}

impl Entity {
    /// Create an empty entity whose components come from the global registry.
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Self::with_registry(name, ComponentRegistry::global())
    }

    /// Create an empty entity that builds its components from `registry`.
    pub fn with_registry(name: impl Into<String>, registry: Arc<ComponentRegistry>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            registry,
            components: RwLock::new(IndexMap::new()),
            children: RwLock::new(IndexMap::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    // ---- Components ----

    /// Create a bare component of `type_name` owned by this entity and attach it.
    ///
    /// Fails if the type is unknown to the registry or already attached.
    pub fn add_component(self: &Arc<Self>, type_name: &str) -> Result<ComponentHandle, SceneError> {
        if self.has_component(type_name) {
            return Err(self.duplicate(type_name));
        }
        let handle = self.registry.create(type_name, self)?;
        match self.components.write().entry(type_name.to_string()) {
            Entry::Occupied(_) => return Err(self.duplicate(type_name)),
            Entry::Vacant(slot) => {
                slot.insert(handle.clone());
            }
        }
        debug!("Attached '{}' to entity '{}'", type_name, self.name);
        Ok(handle)
    }

    fn duplicate(&self, type_name: &str) -> SceneError {
        SceneError::DuplicateComponent {
            entity: self.name.clone(),
            type_name: type_name.to_string(),
        }
    }

    /// The component attached under `type_name`.
    pub fn get_component(&self, type_name: &str) -> Result<ComponentHandle, SceneError> {
        self.components
            .read()
            .get(type_name)
            .cloned()
            .ok_or_else(|| SceneError::ComponentNotFound {
                entity: self.name.clone(),
                type_name: type_name.to_string(),
            })
    }

    pub fn has_component(&self, type_name: &str) -> bool {
        self.components.read().contains_key(type_name)
    }

    pub fn component_count(&self) -> usize {
        self.components.read().len()
    }

    // ---- Children ----

    /// Attach `child` under `name`, returning the child it replaced, if any.
    ///
    /// A replaced subtree is only detached from this entity, nothing else
    /// happens to it.
    pub fn add_child(&self, name: impl Into<String>, child: Arc<Entity>) -> Option<Arc<Entity>> {
        self.children.write().insert(name.into(), child)
    }

    /// Direct child lookup; does not search grandchildren.
    pub fn get_child(&self, name: &str) -> Option<Arc<Entity>> {
        self.children.read().get(name).cloned()
    }

    pub fn child_count(&self) -> usize {
        self.children.read().len()
    }

    /// Depth-first search of this entity's subtree for the first child key
    /// equal to `name`. Children are visited in insertion order, each one's
    /// own subtree before its next sibling.
    pub fn find_descendant(&self, name: &str) -> Option<Arc<Entity>> {
        for (key, child) in self.children_snapshot() {
            if key == name {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// Number of entities below this one, at every depth.
    pub fn descendant_count(&self) -> usize {
        self.children_snapshot()
            .iter()
            .map(|(_, child)| 1 + child.descendant_count())
            .sum()
    }

    // ---- Traversal ----

    /// Apply `visitor` to every direct child in insertion order.
    ///
    /// Returns whatever the visitor produced for each child without waiting
    /// on it; a caller passing an async visitor collects and awaits the
    /// returned futures itself.
    pub fn walk_children<R, F>(&self, mut visitor: F) -> Vec<R>
    where
        F: FnMut(&Arc<Entity>, &str) -> R,
    {
        self.children_snapshot()
            .iter()
            .map(|(name, child)| visitor(child, name.as_str()))
            .collect()
    }

    /// Apply `visitor` to every component of this entity in insertion order.
    pub fn walk_components<R, F>(&self, mut visitor: F) -> Vec<R>
    where
        F: FnMut(&ComponentHandle, &str) -> R,
    {
        self.components_snapshot()
            .iter()
            .map(|(type_name, component)| visitor(component, type_name.as_str()))
            .collect()
    }

    // Visitors may touch this entity again, so they never run under the lock.
    pub(crate) fn children_snapshot(&self) -> Vec<(String, Arc<Entity>)> {
        self.children
            .read()
            .iter()
            .map(|(name, child)| (name.clone(), Arc::clone(child)))
            .collect()
    }

    pub(crate) fn components_snapshot(&self) -> Vec<(String, ComponentHandle)> {
        self.components
            .read()
            .iter()
            .map(|(type_name, component)| (type_name.clone(), component.clone()))
            .collect()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("name", &self.name)
            .field("components", &self.components.read().keys().collect::<Vec<_>>())
            .field("children", &self.children.read().keys().collect::<Vec<_>>())
            .finish()
    }
}
