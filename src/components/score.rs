use std::any::Any;

use anyhow::Context;
use async_trait::async_trait;
use pong_scene::{Component, SetupContext};
use serde::Deserialize;
use serde_json::Value;

use super::GameComponent;

/// Points won by a player.
#[derive(Debug, Default)]
pub struct Score {
    pub points: u32,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ScoreConfig {
    points: u32,
}

impl GameComponent for Score {
    const TYPE_NAME: &'static str = "score";
}

#[async_trait]
impl Component for Score {
    async fn setup(&mut self, _ctx: &SetupContext, config: &Value) -> anyhow::Result<()> {
        let config: ScoreConfig =
            serde_json::from_value(config.clone()).context("invalid score config")?;
        self.points = config.points;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
