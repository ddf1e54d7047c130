use std::sync::Arc;

use futures::future::BoxFuture;

use crate::component::ComponentHandle;
use crate::entity::Entity;
use crate::scene::Scene;

/// Pending result of one visitor application.
pub type VisitFuture = BoxFuture<'static, anyhow::Result<()>>;

/// A per-frame system applied to every entity of a scene.
pub trait EntitySystem: Send + Sync {
    fn visit_entity(&self, entity: &Arc<Entity>, name: &str) -> VisitFuture;
}

/// Blanket implementation so closures can be used as entity systems.
impl<F> EntitySystem for F
where
    F: Fn(&Arc<Entity>, &str) -> VisitFuture + Send + Sync,
{
    fn visit_entity(&self, entity: &Arc<Entity>, name: &str) -> VisitFuture {
        (self)(entity, name)
    }
}

/// A per-frame system applied to every component of a scene.
pub trait ComponentSystem: Send + Sync {
    fn visit_component(&self, component: &ComponentHandle, type_name: &str) -> VisitFuture;
}

/// Blanket implementation so closures can be used as component systems.
impl<F> ComponentSystem for F
where
    F: Fn(&ComponentHandle, &str) -> VisitFuture + Send + Sync,
{
    fn visit_component(&self, component: &ComponentHandle, type_name: &str) -> VisitFuture {
        (self)(component, type_name)
    }
}

enum Stage {
    Entities(Box<dyn EntitySystem>),
    Components(Box<dyn ComponentSystem>),
}

/// An ordered list of systems to run over a scene each frame.
///
/// Each system walks the whole scene and finishes before the next starts.
pub struct Schedule {
    stages: Vec<Stage>,
}

impl Schedule {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Add an entity system to the end of the schedule.
    pub fn add_entity_system<S: EntitySystem + 'static>(&mut self, system: S) {
        self.stages.push(Stage::Entities(Box::new(system)));
    }

    /// Add a component system to the end of the schedule.
    pub fn add_component_system<S: ComponentSystem + 'static>(&mut self, system: S) {
        self.stages.push(Stage::Components(Box::new(system)));
    }

    /// Run all systems in order over `scene`.
    pub async fn run(&self, scene: &Scene) -> anyhow::Result<()> {
        for stage in &self.stages {
            match stage {
                Stage::Entities(system) => {
                    scene.try_walk(|entity, name| system.visit_entity(entity, name)).await?;
                }
                Stage::Components(system) => {
                    scene
                        .walk_components(|component, type_name| system.visit_component(component, type_name))
                        .await?;
                }
            }
        }
        Ok(())
    }

    /// Number of systems in the schedule.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}
