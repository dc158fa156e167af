//! Building `bullets` updates for network transmission

use crate::ws::protocol::{BulletView, ServerMsg};

use super::combat::Bullet;

impl From<&Bullet> for BulletView {
    fn from(b: &Bullet) -> Self {
        Self {
            x: b.x,
            y: b.y,
            angle: b.angle,
            owner: b.owner,
        }
    }
}

/// Full list of remaining bullets plus both sides' health
pub fn build_bullets_update<'a>(
    bullets: impl IntoIterator<Item = &'a Bullet>,
    p1_health: i32,
    p2_health: i32,
) -> ServerMsg {
    ServerMsg::Bullets {
        bullets: bullets.into_iter().map(BulletView::from).collect(),
        p1_health,
        p2_health,
    }
}

/// The update sent when a round resets: no bullets, both sides at full health
pub fn cleared_bullets_update(max_health: i32) -> ServerMsg {
    build_bullets_update(std::iter::empty(), max_health, max_health)
}
