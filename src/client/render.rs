//! Drawable snapshot handed to the render adapter

use crate::ws::protocol::{BulletView, Slot};

use super::state::{ClientState, ConnectionStatus};

/// One ship as the renderer sees it
#[derive(Debug, Clone, PartialEq)]
pub struct ShipView {
    pub slot: Slot,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub health: i32,
    pub is_local: bool,
    pub shield: bool,
    /// Recent positions, oldest first
    pub trail: Vec<(f32, f32)>,
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSnapshot {
    pub ships: [ShipView; 2],
    pub bullets: Vec<BulletView>,
    pub max_health: i32,
    pub status_label: String,
    pub players_label: String,
}

impl ClientState {
    pub fn snapshot(&self) -> RenderSnapshot {
        let view = |slot: Slot| {
            let ship = self.ship(slot);
            let is_local = self.local_slot() == Some(slot);
            ShipView {
                slot,
                x: ship.x,
                y: ship.y,
                angle: ship.angle,
                health: ship.health,
                is_local,
                shield: is_local && self.shield_active(),
                trail: ship.history().collect(),
            }
        };

        RenderSnapshot {
            ships: [view(Slot::P1), view(Slot::P2)],
            bullets: self.bullets().to_vec(),
            max_health: self.config().max_health,
            status_label: self.status_label(),
            players_label: self.players_label().to_string(),
        }
    }

    fn status_label(&self) -> String {
        match (self.status(), self.local_slot()) {
            (ConnectionStatus::Connecting, _) => "Connecting".to_string(),
            (ConnectionStatus::Connected, _) => "Connected".to_string(),
            (ConnectionStatus::WaitingForOpponent, None) => {
                "Server full, waiting for a free slot".to_string()
            }
            (ConnectionStatus::WaitingForOpponent, Some(slot)) => {
                format!("Connected as {}", slot_name(slot))
            }
            (ConnectionStatus::Active, Some(slot)) => format!("Battle! You are {}", slot_name(slot)),
            (ConnectionStatus::Active, None) => "Battle!".to_string(),
            (ConnectionStatus::GameOver, _) => match self.loser() {
                Some(loser) if Some(loser) == self.local_slot() => {
                    "You lose! Press restart".to_string()
                }
                Some(_) => "You win! Press restart".to_string(),
                None => "Game over".to_string(),
            },
            (ConnectionStatus::Disconnected, _) => "Disconnected".to_string(),
        }
    }

    fn players_label(&self) -> &'static str {
        match self.status() {
            ConnectionStatus::Active | ConnectionStatus::GameOver => "Opponent connected",
            ConnectionStatus::Disconnected => "",
            _ => "Waiting for player",
        }
    }
}

fn slot_name(slot: Slot) -> &'static str {
    match slot {
        Slot::P1 => "P1",
        Slot::P2 => "P2",
    }
}
