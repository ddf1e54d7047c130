use std::any::Any;

use anyhow::Context;
use async_trait::async_trait;
use glam::Vec2;
use pong_scene::{Component, SetupContext};
use serde::Deserialize;
use serde_json::Value;

use super::{GameComponent, Position};

/// Constant velocity, integrated into the entity's position every frame.
#[derive(Debug, Default)]
pub struct Motion {
    pub velocity: Vec2,
}

#[derive(Deserialize)]
struct MotionConfig {
    #[serde(default)]
    vx: f32,
    #[serde(default)]
    vy: f32,
}

impl GameComponent for Motion {
    const TYPE_NAME: &'static str = "motion";
}

#[async_trait]
impl Component for Motion {
    async fn setup(&mut self, ctx: &SetupContext, config: &Value) -> anyhow::Result<()> {
        let config: MotionConfig =
            serde_json::from_value(config.clone()).context("invalid motion config")?;
        // Only the structure is guaranteed here, not the position's configuration.
        anyhow::ensure!(
            ctx.entity().has_component(Position::TYPE_NAME),
            "'{}' has motion but no position",
            ctx.entity().name()
        );
        self.velocity = Vec2::new(config.vx, config.vy);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
