//! Combat simulator - bullets, hit detection, damage

use tracing::debug;

use crate::config::GameConfig;
use crate::ws::protocol::{ServerMsg, Slot};

use super::physics::{heading_vector, normalize_angle, Rect, Ship};
use super::snapshot::build_bullets_update;

/// A live bullet. Velocity is fixed at spawn and never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub x: f32,
    pub y: f32,
    /// Heading in degrees
    pub angle: f32,
    pub owner: Slot,
    vel_x: f32,
    vel_y: f32,
}

impl Bullet {
    /// Spawn at the leading edge of `ship`, heading where the ship faces
    pub fn spawn(owner: Slot, ship: &Ship, config: &GameConfig) -> Self {
        let angle = normalize_angle(ship.angle);
        let (cx, cy) = ship.hitbox(config).center();
        let (ox, oy) = heading_vector(angle, config.fire_offset);
        let (vel_x, vel_y) = heading_vector(angle, config.bullet_speed);
        Self {
            x: cx + ox - config.bullet_width / 2.0,
            y: cy + oy - config.bullet_height / 2.0,
            angle,
            owner,
            vel_x,
            vel_y,
        }
    }

    /// Per-tick displacement
    pub fn velocity(&self) -> (f32, f32) {
        (self.vel_x, self.vel_y)
    }

    pub fn advance(&mut self) {
        self.x += self.vel_x;
        self.y += self.vel_y;
    }

    pub fn hitbox(&self, config: &GameConfig) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            w: config.bullet_width,
            h: config.bullet_height,
        }
    }

    /// True once the bullet has crossed the playfield edge on either axis.
    /// A non-finite position counts as outside.
    pub fn is_out_of_bounds(&self, config: &GameConfig) -> bool {
        !self.x.is_finite()
            || !self.y.is_finite()
            || self.x < 0.0
            || self.y < 0.0
            || self.x > config.playfield_width
            || self.y > config.playfield_height
    }
}

/// Outcome of one simulator pass
#[derive(Debug, Default)]
pub struct TickReport {
    /// `bullets` update to broadcast, if anything moved or was cleared
    pub update: Option<ServerMsg>,
    /// Slots whose health is at or below zero after this pass
    pub deaths: Vec<Slot>,
    /// Confirmed hits this pass
    pub hits: usize,
}

/// Per-slot bullet buckets and the tick pass over them
#[derive(Debug, Default)]
pub struct CombatSimulator {
    buckets: [Vec<Bullet>; 2],
}

impl CombatSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn exactly one bullet for `owner`
    pub fn fire(&mut self, owner: Slot, ship: &Ship, config: &GameConfig) {
        let bullet = Bullet::spawn(owner, ship, config);
        debug!(slot = ?owner, x = bullet.x, y = bullet.y, angle = bullet.angle, "Bullet spawned");
        self.buckets[owner.index()].push(bullet);
    }

    pub fn bullets(&self, owner: Slot) -> &[Bullet] {
        &self.buckets[owner.index()]
    }

    /// All live bullets, P1's bucket first
    pub fn all_bullets(&self) -> impl Iterator<Item = &Bullet> {
        self.buckets.iter().flatten()
    }

    pub fn has_bullets(&self) -> bool {
        self.buckets.iter().any(|b| !b.is_empty())
    }

    pub fn clear(&mut self, owner: Slot) {
        self.buckets[owner.index()].clear();
    }

    pub fn clear_all(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    /// Run one pass: advance, resolve hits, cull, report
    pub fn step(&mut self, ships: [&mut Ship; 2], config: &GameConfig) -> TickReport {
        let had_bullets = self.has_bullets();
        let before: [usize; 2] = [self.buckets[0].len(), self.buckets[1].len()];

        for bullet in self.buckets.iter_mut().flatten() {
            bullet.advance();
        }

        let mut hits = 0;
        let [p1, p2] = ships;
        for (target, ship) in [(Slot::P1, &mut *p1), (Slot::P2, &mut *p2)] {
            let hitbox = ship.hitbox(config);
            let incoming = &mut self.buckets[target.opponent().index()];
            incoming.retain(|bullet| {
                if bullet.hitbox(config).overlaps(&hitbox) {
                    ship.take_hit(config.hit_damage);
                    hits += 1;
                    false
                } else {
                    true
                }
            });
        }

        for bucket in &mut self.buckets {
            bucket.retain(|bullet| !bullet.is_out_of_bounds(config));
        }

        // surviving bullets moved, or some were destroyed this pass
        let after = [self.buckets[0].len(), self.buckets[1].len()];
        let changed = before != after || self.has_bullets();

        let mut report = TickReport {
            hits,
            ..TickReport::default()
        };
        if changed || had_bullets {
            report.update = Some(build_bullets_update(
                self.all_bullets(),
                p1.health,
                p2.health,
            ));
        }
        for (slot, ship) in [(Slot::P1, &*p1), (Slot::P2, &*p2)] {
            if ship.is_dead() {
                report.deaths.push(slot);
            }
        }
        report
    }
}
