use std::any::Any;

use anyhow::Context;
use async_trait::async_trait;
use pong_scene::{Component, SetupContext};
use serde::Deserialize;
use serde_json::Value;

use super::GameComponent;

/// Vertical reach of a paddle around its position.
#[derive(Debug, Default)]
pub struct Paddle {
    pub half_height: f32,
}

#[derive(Deserialize)]
struct PaddleConfig {
    half_height: f32,
}

impl GameComponent for Paddle {
    const TYPE_NAME: &'static str = "paddle";
}

#[async_trait]
impl Component for Paddle {
    async fn setup(&mut self, _ctx: &SetupContext, config: &Value) -> anyhow::Result<()> {
        let config: PaddleConfig =
            serde_json::from_value(config.clone()).context("invalid paddle config")?;
        anyhow::ensure!(config.half_height > 0.0, "paddle half_height must be positive");
        self.half_height = config.half_height;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
