//! Ship state, spawn poses and axis-aligned overlap tests

use std::collections::VecDeque;

use crate::config::GameConfig;
use crate::ws::protocol::{Pose, Slot};

/// Simulation state of one ship (no presentation data)
#[derive(Debug, Clone, PartialEq)]
pub struct Ship {
    /// Top-left corner of the hit box
    pub x: f32,
    pub y: f32,
    /// Facing in degrees, always in [0, 360)
    pub angle: f32,
    pub health: i32,
    history: VecDeque<(f32, f32)>,
    history_capacity: usize,
}

impl Ship {
    /// Fresh ship at the spawn pose for `slot`
    pub fn spawn(slot: Slot, config: &GameConfig) -> Self {
        let pose = spawn_pose(slot, config);
        Self {
            x: pose.x,
            y: pose.y,
            angle: pose.angle,
            health: config.max_health,
            history: VecDeque::with_capacity(config.history_capacity),
            history_capacity: config.history_capacity,
        }
    }

    pub fn pose(&self) -> Pose {
        Pose {
            x: self.x,
            y: self.y,
            angle: self.angle,
        }
    }

    /// Set an absolute pose, recording the previous position in the history
    pub fn set_pose(&mut self, pose: Pose) {
        self.record_position();
        self.x = pose.x;
        self.y = pose.y;
        self.angle = normalize_angle(pose.angle);
    }

    /// Translate by a delta, recording the previous position
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.record_position();
        self.x += dx;
        self.y += dy;
    }

    pub fn rotate(&mut self, degrees: f32) {
        self.angle = normalize_angle(self.angle + degrees);
    }

    /// Recent positions, oldest first
    pub fn history(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.history.iter().copied()
    }

    pub fn reset_health(&mut self, max_health: i32) {
        self.health = max_health;
    }

    /// Apply one hit; health may go below zero
    pub fn take_hit(&mut self, damage: i32) {
        self.health -= damage;
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    pub fn hitbox(&self, config: &GameConfig) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            w: config.ship_width,
            h: config.ship_height,
        }
    }

    fn record_position(&mut self) {
        if self.history_capacity == 0 {
            return;
        }
        if self.history.len() == self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back((self.x, self.y));
    }
}

/// Starting pose for a slot: P1 on the left facing right, P2 on the right facing left
pub fn spawn_pose(slot: Slot, config: &GameConfig) -> Pose {
    let margin = 25.0;
    let y = (config.playfield_height - config.ship_height) / 2.0;
    match slot {
        Slot::P1 => Pose {
            x: margin,
            y,
            angle: 0.0,
        },
        Slot::P2 => Pose {
            x: config.playfield_width - config.ship_width - margin,
            y,
            angle: 180.0,
        },
    }
}

/// Normalize degrees to [0, 360)
pub fn normalize_angle(degrees: f32) -> f32 {
    let a = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

/// Per-tick displacement for a heading; screen y grows downward
pub fn heading_vector(degrees: f32, speed: f32) -> (f32, f32) {
    let rad = degrees.to_radians();
    (speed * rad.cos(), -speed * rad.sin())
}

/// Axis-aligned rectangle anchored at its top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}
