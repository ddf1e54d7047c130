use std::any::Any;

use anyhow::Context;
use async_trait::async_trait;
use glam::Vec2;
use pong_scene::{Component, SetupContext};
use serde::Deserialize;
use serde_json::Value;

use super::GameComponent;

/// Location of an entity on the court, in court units.
#[derive(Debug, Default)]
pub struct Position {
    pub value: Vec2,
    /// Where the entity started; the referee serves from here.
    pub origin: Vec2,
}

#[derive(Deserialize)]
struct PositionConfig {
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
}

impl GameComponent for Position {
    const TYPE_NAME: &'static str = "position";
}

#[async_trait]
impl Component for Position {
    async fn setup(&mut self, _ctx: &SetupContext, config: &Value) -> anyhow::Result<()> {
        let config: PositionConfig =
            serde_json::from_value(config.clone()).context("invalid position config")?;
        self.value = Vec2::new(config.x, config.y);
        self.origin = self.value;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
