//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};

/// One of the two fixed match seats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    P1,
    P2,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::P1, Slot::P2];

    /// Index into two-element per-slot arrays
    pub fn index(self) -> usize {
        match self {
            Slot::P1 => 0,
            Slot::P2 => 1,
        }
    }

    pub fn opponent(self) -> Slot {
        match self {
            Slot::P1 => Slot::P2,
            Slot::P2 => Slot::P1,
        }
    }
}

/// Slot named by an `init` message; `full` means the sender was queued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitSlot {
    P1,
    P2,
    Full,
}

impl InitSlot {
    /// The assigned slot, or `None` for `full`
    pub fn slot(self) -> Option<Slot> {
        match self {
            Self::P1 => Some(Slot::P1),
            Self::P2 => Some(Slot::P2),
            Self::Full => None,
        }
    }
}

impl From<Slot> for InitSlot {
    fn from(slot: Slot) -> Self {
        match slot {
            Slot::P1 => Self::P1,
            Slot::P2 => Self::P2,
        }
    }
}

/// Absolute ship pose carried by `move`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    /// Facing in degrees
    pub angle: f32,
}

impl Pose {
    /// False if any component is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.angle.is_finite()
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Absolute position of the sender's ship after local prediction
    Move { slot: Slot, position: Pose },

    /// Spawn a bullet from the sender's current pose
    Fire,

    /// Start a new round after a death
    Restart,
}

impl ClientMsg {
    pub fn action(&self) -> &'static str {
        match self {
            ClientMsg::Move { .. } => "move",
            ClientMsg::Fire => "fire",
            ClientMsg::Restart => "restart",
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Slot assignment, or `full` when queued
    Init { slot: InitSlot },

    /// Both slots filled, battle is active
    Ready,

    /// The opponent disconnected
    PlayerLeft,

    /// Pose of the ship in `slot` (relayed or seeded)
    Move { slot: Slot, position: Pose },

    /// Every live bullet plus both sides' health
    Bullets {
        bullets: Vec<BulletView>,
        p1_health: i32,
        p2_health: i32,
    },

    /// The ship in `slot` was destroyed
    Death { slot: Slot },

    /// A new round has started
    Restart,
}

/// Bullet state in a `bullets` update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BulletView {
    pub x: f32,
    pub y: f32,
    /// Heading in degrees, fixed at spawn
    pub angle: f32,
    pub owner: Slot,
}

/// Reasons an inbound message is refused
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtocolError {
    #[error("sender holds no slot")]
    Unassigned,

    #[error("sender holds {held:?} but message names {claimed:?}")]
    WrongSlot { held: Slot, claimed: Slot },

    #[error("{0} ignored while the match is not ready")]
    NotReady(&'static str),

    #[error("restart ignored while the round is still running")]
    RoundInProgress,

    #[error("pose has a non-finite component")]
    NonFinite,

    #[error("unknown participant")]
    UnknownParticipant,
}
