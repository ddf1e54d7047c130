use std::any::Any;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use glam::Vec2;
use pong_scene::{Component, Entity, SetupContext};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{read, write, GameComponent, Motion, Paddle, Position, Score};

/// Horizontal distance within which a paddle returns the ball.
const PADDLE_REACH: f32 = 0.5;

/// Enforces the rules: bounces the ball, awards points and re-serves.
///
/// The players and the ball are looked up by name during setup. Their own
/// components may still be unconfigured at that point, so only the entities
/// are kept and their state is read each frame.
#[derive(Debug, Default)]
pub struct Referee {
    ball: Option<Arc<Entity>>,
    left: Option<Arc<Entity>>,
    right: Option<Arc<Entity>>,
    half_extents: Vec2,
}

#[derive(Deserialize)]
struct RefereeConfig {
    ball: String,
    left: String,
    right: String,
    court: CourtConfig,
}

#[derive(Deserialize)]
struct CourtConfig {
    width: f32,
    height: f32,
}

/// Outcome of one frame of officiating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Play,
    PointLeft,
    PointRight,
}

impl GameComponent for Referee {
    const TYPE_NAME: &'static str = "referee";
}

impl Referee {
    fn entities(&self) -> anyhow::Result<(&Arc<Entity>, &Arc<Entity>, &Arc<Entity>)> {
        match (&self.ball, &self.left, &self.right) {
            (Some(ball), Some(left), Some(right)) => Ok((ball, left, right)),
            _ => anyhow::bail!("referee used before setup"),
        }
    }

    /// Apply the rules to the current frame.
    pub async fn officiate(&self) -> anyhow::Result<Call> {
        let (ball, left, right) = self.entities()?;
        let half = self.half_extents;

        let mut pos = read::<Position, _>(ball, |p| p.value).await?;
        let mut vel = read::<Motion, _>(ball, |m| m.velocity).await?;

        if pos.y.abs() > half.y {
            pos.y = pos.y.clamp(-half.y, half.y);
            vel.y = -vel.y;
        }

        for paddle in [left, right] {
            let at = read::<Position, _>(paddle, |p| p.value).await?;
            let reach = read::<Paddle, _>(paddle, |p| p.half_height).await?;
            let approaching = vel.x * (at.x - pos.x) > 0.0;
            if approaching && (pos.x - at.x).abs() <= PADDLE_REACH && (pos.y - at.y).abs() <= reach {
                vel.x = -vel.x;
            }
        }

        let call = if pos.x < -half.x {
            Call::PointRight
        } else if pos.x > half.x {
            Call::PointLeft
        } else {
            Call::Play
        };

        if call != Call::Play {
            let winner = if call == Call::PointLeft { left } else { right };
            let points = write::<Score, _>(winner, |s| {
                s.points += 1;
                s.points
            })
            .await?;
            info!("Point for {} ({} total)", winner.name(), points);

            // Serve from the centre towards the player who lost the point.
            pos = read::<Position, _>(ball, |p| p.origin).await?;
            vel.x = if call == Call::PointLeft { vel.x.abs() } else { -vel.x.abs() };
        }

        write::<Position, _>(ball, |p| p.value = pos).await?;
        write::<Motion, _>(ball, |m| m.velocity = vel).await?;
        Ok(call)
    }
}

#[async_trait]
impl Component for Referee {
    async fn setup(&mut self, ctx: &SetupContext, config: &Value) -> anyhow::Result<()> {
        let config: RefereeConfig =
            serde_json::from_value(config.clone()).context("invalid referee config")?;
        self.ball = Some(ctx.find_object(&config.ball)?);
        self.left = Some(ctx.find_object(&config.left)?);
        self.right = Some(ctx.find_object(&config.right)?);
        self.half_extents = Vec2::new(config.court.width, config.court.height) / 2.0;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
