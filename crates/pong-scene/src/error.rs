use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building, querying or configuring a scene.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("no component factory registered for '{type_name}' (requested by entity '{entity}')")]
    UnknownComponentType { entity: String, type_name: String },

    #[error("entity '{entity}' already has a '{type_name}' component")]
    DuplicateComponent { entity: String, type_name: String },

    #[error("entity '{entity}' has no '{type_name}' component")]
    ComponentNotFound { entity: String, type_name: String },

    #[error("no object named '{0}' in the scene")]
    ObjectNotFound(String),

    #[error("setup of '{type_name}' on entity '{entity}' failed: {source}")]
    SetupFailure {
        entity: String,
        type_name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("no scene is currently active")]
    NoActiveScene,

    #[error("invalid scene description: {0}")]
    InvalidDescription(#[from] serde_json::Error),

    #[error("I/O error reading scene description '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),
}

impl SceneError {
    /// Name of the entity the error refers to, when there is one.
    pub fn entity(&self) -> Option<&str> {
        match self {
            SceneError::UnknownComponentType { entity, .. }
            | SceneError::DuplicateComponent { entity, .. }
            | SceneError::ComponentNotFound { entity, .. }
            | SceneError::SetupFailure { entity, .. } => Some(entity),
            SceneError::ObjectNotFound(name) => Some(name),
            _ => None,
        }
    }
}
