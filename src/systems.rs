//! Per-frame systems

use std::sync::Arc;

use anyhow::Context;
use futures::FutureExt;
use pong_scene::{ComponentHandle, Entity, Schedule, Scene, VisitFuture};
use tracing::trace;

use crate::components::{self, GameComponent, Motion, Position, Referee, Score};

/// Build the frame schedule: movement, then rules, then the frame dump.
pub fn schedule(frame_dt: f32) -> Schedule {
    let mut schedule = Schedule::new();
    schedule.add_component_system(move |component: &ComponentHandle, type_name: &str| -> VisitFuture {
        if type_name != Motion::TYPE_NAME {
            return async { Ok(()) }.boxed();
        }
        integrate(component.clone(), frame_dt).boxed()
    });
    schedule.add_component_system(|component: &ComponentHandle, type_name: &str| -> VisitFuture {
        if type_name != Referee::TYPE_NAME {
            return async { Ok(()) }.boxed();
        }
        officiate(component.clone()).boxed()
    });
    schedule.add_entity_system(|entity: &Arc<Entity>, name: &str| -> VisitFuture {
        trace_position(Arc::clone(entity), name.to_string()).boxed()
    });
    schedule
}

async fn integrate(motion: ComponentHandle, dt: f32) -> anyhow::Result<()> {
    let owner = motion.owner().context("motion outlived its entity")?;
    let velocity = {
        let guard = motion.lock().await;
        guard
            .downcast_ref::<Motion>()
            .map(|m| m.velocity)
            .context("motion has an unexpected type")?
    };
    components::write::<Position, _>(&owner, |p| p.value += velocity * dt).await
}

async fn officiate(referee: ComponentHandle) -> anyhow::Result<()> {
    let guard = referee.lock().await;
    let referee = guard
        .downcast_ref::<Referee>()
        .context("referee has an unexpected type")?;
    referee.officiate().await?;
    Ok(())
}

async fn trace_position(entity: Arc<Entity>, name: String) -> anyhow::Result<()> {
    if entity.has_component(Position::TYPE_NAME) {
        let at = components::read::<Position, _>(&entity, |p| p.value).await?;
        trace!("{} at ({:.2}, {:.2})", name, at.x, at.y);
    }
    Ok(())
}

/// Points of every entity carrying a score, in scene order.
pub async fn scores(scene: &Scene) -> anyhow::Result<Vec<(String, u32)>> {
    let mut scores = Vec::new();
    let scored = scene.visit_all(|entity, _| entity.has_component(Score::TYPE_NAME).then(|| Arc::clone(entity)));
    for entity in scored.into_iter().flatten() {
        let points = components::read::<Score, _>(&entity, |s| s.points).await?;
        scores.push((entity.name().to_string(), points));
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pong_scene::{ComponentRegistry, SceneDescription};

    fn registry() -> Arc<ComponentRegistry> {
        let registry = Arc::new(ComponentRegistry::new());
        components::register_all(&registry);
        registry
    }

    const RALLY: &str = r#"{
        "court": {
            "children": {
                "ball": {
                    "components": {
                        "position": { "x": 0.0, "y": 0.0 },
                        "motion": { "vx": 10.0, "vy": 0.0 }
                    }
                },
                "paddle_left": {
                    "components": {
                        "position": { "x": -4.5, "y": 0.0 },
                        "paddle": { "half_height": 1.0 },
                        "score": {}
                    }
                },
                "paddle_right": {
                    "components": {
                        "position": { "x": 4.5, "y": 3.0 },
                        "paddle": { "half_height": 1.0 },
                        "score": {}
                    }
                }
            }
        },
        "referee": {
            "components": {
                "referee": {
                    "ball": "ball",
                    "left": "paddle_left",
                    "right": "paddle_right",
                    "court": { "width": 10.0, "height": 6.0 }
                }
            }
        }
    }"#;

    #[tokio::test]
    async fn motion_moves_the_ball() {
        let description = SceneDescription::from_json_str(RALLY).unwrap();
        let scene = Scene::build_with(registry(), &description).await.unwrap();

        schedule(0.1).run(&scene).await.unwrap();

        let ball = scene.find_object("ball").unwrap();
        let at = components::read::<Position, _>(&ball, |p| p.value).await.unwrap();
        assert!((at.x - 1.0).abs() < 1e-5);
        assert_eq!(at.y, 0.0);
    }

    #[tokio::test]
    async fn missed_ball_scores_for_the_other_side() {
        let description = SceneDescription::from_json_str(RALLY).unwrap();
        let scene = Scene::build_with(registry(), &description).await.unwrap();
        let frames = schedule(0.1);

        // The right paddle sits out of reach, so the ball runs past it.
        for _ in 0..6 {
            frames.run(&scene).await.unwrap();
        }

        let scores = scores(&scene).await.unwrap();
        assert_eq!(
            scores,
            vec![("paddle_left".to_string(), 1), ("paddle_right".to_string(), 0)]
        );

        // Re-served from the centre, heading for the right player.
        let ball = scene.find_object("ball").unwrap();
        let velocity = components::read::<Motion, _>(&ball, |m| m.velocity).await.unwrap();
        assert!(velocity.x > 0.0);
    }

    #[tokio::test]
    async fn paddle_in_reach_returns_the_ball() {
        let description = SceneDescription::from_json_str(&RALLY.replace("\"y\": 3.0", "\"y\": 0.0")).unwrap();
        let scene = Scene::build_with(registry(), &description).await.unwrap();
        let frames = schedule(0.1);

        for _ in 0..5 {
            frames.run(&scene).await.unwrap();
        }

        let ball = scene.find_object("ball").unwrap();
        let velocity = components::read::<Motion, _>(&ball, |m| m.velocity).await.unwrap();
        assert!(velocity.x < 0.0);
        assert_eq!(scores(&scene).await.unwrap()[1].1, 0);
    }

    #[tokio::test]
    async fn referee_needs_its_players() {
        let description = SceneDescription::from_json_str(&RALLY.replace("\"right\": \"paddle_right\"", "\"right\": \"goalie\"")).unwrap();
        let result = Scene::build_with(registry(), &description).await;
        assert!(matches!(result, Err(pong_scene::SceneError::SetupFailure { .. })));
    }
}
