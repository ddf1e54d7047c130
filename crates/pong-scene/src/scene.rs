use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::active;
use crate::component::{ComponentHandle, SetupContext};
use crate::description::{EntityDescription, SceneDescription};
use crate::entity::Entity;
use crate::error::SceneError;
use crate::registry::ComponentRegistry;

/// Lifecycle of a scene instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    /// Created, no build started.
    Unbuilt,
    /// Structure built, component setups in flight.
    Building,
    /// The build failed; the scene was never published as ready.
    ConfigFailed,
    /// Every setup completed.
    Ready,
}

/// Root container of the entity forest.
pub struct Scene {
    registry: Arc<ComponentRegistry>,
    roots: RwLock<IndexMap<String, Arc<Entity>>>,
    state: RwLock<SceneState>,
}

impl Scene {
    /// An empty, unbuilt scene whose entities use `registry`.
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self {
            registry,
            roots: RwLock::new(IndexMap::new()),
            state: RwLock::new(SceneState::Unbuilt),
        }
    }

    // ---- Construction ----

    /// Build a scene from `description` with the global component registry.
    pub async fn build(description: &SceneDescription) -> Result<Arc<Self>, SceneError> {
        Self::build_with(ComponentRegistry::global(), description).await
    }

    /// Build a scene from `description`, creating components from `registry`.
    ///
    /// The whole forest is instantiated first and published as the active
    /// scene, then every component's `setup` runs and the build resolves once
    /// all of them have completed, including when some fail. Every failure
    /// is logged; the build returns the first in description order and the
    /// previously active scene is restored.
    pub async fn build_with(
        registry: Arc<ComponentRegistry>,
        description: &SceneDescription,
    ) -> Result<Arc<Self>, SceneError> {
        let scene = Arc::new(Self::new(registry));
        scene.set_state(SceneState::Building);
        info!("Building scene with {} root(s)", description.len());

        for (name, entity) in description.entities() {
            match scene.instantiate(name, entity) {
                Ok(root) => {
                    scene.add_root(name, root);
                }
                Err(err) => {
                    scene.set_state(SceneState::ConfigFailed);
                    warn!("Scene construction failed: {}", err);
                    return Err(err);
                }
            }
        }

        let previous = active::activate(&scene);

        let mut setups = Vec::new();
        let collected = description.entities().try_for_each(|(name, entity)| {
            let root = scene.root(name).ok_or_else(|| SceneError::ObjectNotFound(name.to_string()))?;
            scene.collect_setups(&root, entity, &mut setups)
        });
        let result = match collected {
            Ok(()) => {
                debug!("Running {} component setup(s)", setups.len());
                let pending = setups
                    .into_iter()
                    .map(|(handle, ctx, config)| async move { handle.setup(ctx, config).await });
                let mut first = None;
                for err in join_all(pending).await.into_iter().filter_map(Result::err) {
                    warn!("Component setup failed: {}", err);
                    first.get_or_insert(err);
                }
                first.map_or(Ok(()), Err)
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => {
                scene.set_state(SceneState::Ready);
                info!("Scene ready with {} entities", scene.entity_count());
                Ok(scene)
            }
            Err(err) => {
                scene.set_state(SceneState::ConfigFailed);
                warn!("Scene configuration failed: {}", err);
                active::rollback(&scene, previous);
                Err(err)
            }
        }
    }

    /// Create `name` with bare components, then its children, to full depth.
    fn instantiate(&self, name: &str, description: &EntityDescription) -> Result<Arc<Entity>, SceneError> {
        let entity = Entity::with_registry(name, Arc::clone(&self.registry));
        for type_name in description.components.keys() {
            entity.add_component(type_name)?;
        }
        for (child_name, child) in &description.children {
            let child_entity = self.instantiate(child_name, child)?;
            entity.add_child(child_name.clone(), child_entity);
        }
        Ok(entity)
    }

    fn collect_setups<'d>(
        self: &Arc<Self>,
        entity: &Arc<Entity>,
        description: &'d EntityDescription,
        out: &mut Vec<(ComponentHandle, SetupContext, &'d Value)>,
    ) -> Result<(), SceneError> {
        for (type_name, config) in &description.components {
            let handle = entity.get_component(type_name)?;
            let ctx = SetupContext::new(Arc::clone(self), Arc::clone(entity), type_name);
            out.push((handle, ctx, config));
        }
        for (child_name, child) in &description.children {
            let child_entity = entity
                .get_child(child_name)
                .ok_or_else(|| SceneError::ObjectNotFound(child_name.clone()))?;
            self.collect_setups(&child_entity, child, out)?;
        }
        Ok(())
    }

    /// Attach a root entity, returning the root it replaced, if any.
    pub fn add_root(&self, name: impl Into<String>, root: Arc<Entity>) -> Option<Arc<Entity>> {
        self.roots.write().insert(name.into(), root)
    }

    // ---- Queries ----

    pub fn state(&self) -> SceneState {
        *self.state.read()
    }

    fn set_state(&self, state: SceneState) {
        *self.state.write() = state;
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    pub fn root(&self, name: &str) -> Option<Arc<Entity>> {
        self.roots.read().get(name).cloned()
    }

    /// Root entities in insertion order.
    pub fn roots(&self) -> Vec<(String, Arc<Entity>)> {
        self.roots
            .read()
            .iter()
            .map(|(name, root)| (name.clone(), Arc::clone(root)))
            .collect()
    }

    /// Total number of entities at every depth.
    pub fn entity_count(&self) -> usize {
        self.roots()
            .iter()
            .map(|(_, root)| 1 + root.descendant_count())
            .sum()
    }

    /// Find an entity anywhere in the forest by name.
    ///
    /// Roots are checked directly first. Otherwise each root's subtree is
    /// searched depth-first, roots and children in insertion order, and the
    /// first match wins when a name appears under several parents.
    pub fn find_object(&self, name: &str) -> Result<Arc<Entity>, SceneError> {
        if let Some(root) = self.root(name) {
            return Ok(root);
        }
        self.roots()
            .iter()
            .find_map(|(_, root)| root.find_descendant(name))
            .ok_or_else(|| SceneError::ObjectNotFound(name.to_string()))
    }

    // ---- Traversal ----

    /// Apply `visitor` to every entity at every depth, parents before their
    /// children, and return the results in visiting order.
    pub fn visit_all<R, F>(&self, mut visitor: F) -> Vec<R>
    where
        F: FnMut(&Arc<Entity>, &str) -> R,
    {
        let mut out = Vec::new();
        for (name, root) in self.roots() {
            visit_subtree(&root, &name, &mut visitor, &mut out);
        }
        out
    }

    /// Run an async visitor on every entity at every depth.
    ///
    /// All visits are started before any is awaited; the walk completes once
    /// every one of them has.
    pub async fn walk<F, Fut>(&self, visitor: F)
    where
        F: FnMut(&Arc<Entity>, &str) -> Fut,
        Fut: Future<Output = ()>,
    {
        let pending = self.visit_all(visitor);
        join_all(pending).await;
    }

    /// Like [`Scene::walk`] for fallible visitors. Fails with the first error
    /// once it is observed.
    pub async fn try_walk<F, Fut, E>(&self, visitor: F) -> Result<(), E>
    where
        F: FnMut(&Arc<Entity>, &str) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let pending = self.visit_all(visitor);
        try_join_all(pending).await?;
        Ok(())
    }

    /// Run an async visitor on every component of every entity.
    pub async fn walk_components<F, Fut, E>(&self, mut visitor: F) -> Result<(), E>
    where
        F: FnMut(&ComponentHandle, &str) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let mut pending = Vec::new();
        for entity in self.visit_all(|entity, _| Arc::clone(entity)) {
            pending.extend(entity.walk_components(&mut visitor));
        }
        try_join_all(pending).await?;
        Ok(())
    }
}

fn visit_subtree<R, F>(entity: &Arc<Entity>, name: &str, visitor: &mut F, out: &mut Vec<R>)
where
    F: FnMut(&Arc<Entity>, &str) -> R,
{
    out.push(visitor(entity, name));
    for (child_name, child) in entity.children_snapshot() {
        visit_subtree(&child, &child_name, visitor, out);
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("state", &self.state())
            .field("roots", &self.roots.read().keys().collect::<Vec<_>>())
            .finish()
    }
}
