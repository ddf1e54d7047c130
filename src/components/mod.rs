//! Concrete Pong components
//!
//! Each component is registered under its `TYPE_NAME`, which is the key used
//! in scene description documents.

mod motion;
mod paddle;
mod position;
mod referee;
mod score;

use anyhow::Context;
use pong_scene::{Component, ComponentRegistry, Entity};

pub use motion::Motion;
pub use paddle::Paddle;
pub use position::Position;
pub use referee::Referee;
pub use score::Score;

/// A component the game knows by name.
pub trait GameComponent: Component + Default {
    const TYPE_NAME: &'static str;
}

/// Register every game component into `registry`.
pub fn register_all(registry: &ComponentRegistry) {
    register::<Position>(registry);
    register::<Motion>(registry);
    register::<Paddle>(registry);
    register::<Score>(registry);
    register::<Referee>(registry);
}

fn register<T: GameComponent>(registry: &ComponentRegistry) {
    registry.register_default::<T>(T::TYPE_NAME);
}

/// Read a value out of `entity`'s `T` component.
pub async fn read<T: GameComponent, R>(entity: &Entity, f: impl FnOnce(&T) -> R) -> anyhow::Result<R> {
    let handle = entity.get_component(T::TYPE_NAME)?;
    let guard = handle.lock().await;
    let component = guard
        .downcast_ref::<T>()
        .with_context(|| format!("'{}' on '{}' has an unexpected type", T::TYPE_NAME, entity.name()))?;
    Ok(f(component))
}

/// Mutate `entity`'s `T` component.
pub async fn write<T: GameComponent, R>(entity: &Entity, f: impl FnOnce(&mut T) -> R) -> anyhow::Result<R> {
    let handle = entity.get_component(T::TYPE_NAME)?;
    let mut guard = handle.lock().await;
    let component = guard
        .downcast_mut::<T>()
        .with_context(|| format!("'{}' on '{}' has an unexpected type", T::TYPE_NAME, entity.name()))?;
    Ok(f(component))
}
