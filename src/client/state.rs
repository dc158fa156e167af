//! Client connection state machine, local prediction and reconciliation

use tracing::{debug, info};

use crate::config::GameConfig;
use crate::game::physics::Ship;
use crate::ws::protocol::{BulletView, ClientMsg, ServerMsg, Slot};

use super::input::Intent;

/// Connection lifecycle as seen by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    WaitingForOpponent,
    Active,
    GameOver,
    /// Terminal
    Disconnected,
}

/// Everything the client knows about the match
#[derive(Debug)]
pub struct ClientState {
    config: GameConfig,
    status: ConnectionStatus,
    local_slot: Option<Slot>,
    /// Told `full`, holding no slot
    queued: bool,
    ships: [Ship; 2],
    bullets: Vec<BulletView>,
    shield: bool,
    /// Slot that lost the last round
    loser: Option<Slot>,
    outgoing: Vec<ClientMsg>,
}

impl ClientState {
    pub fn new(config: GameConfig) -> Self {
        let ships = [
            Ship::spawn(Slot::P1, &config),
            Ship::spawn(Slot::P2, &config),
        ];
        Self {
            config,
            status: ConnectionStatus::Connecting,
            local_slot: None,
            queued: false,
            ships,
            bullets: Vec::new(),
            shield: false,
            loser: None,
            outgoing: Vec::new(),
        }
    }

    /// Transport is up
    pub fn on_connected(&mut self) {
        if self.status == ConnectionStatus::Connecting {
            self.status = ConnectionStatus::Connected;
        }
    }

    /// Transport lost; no further transitions
    pub fn on_disconnected(&mut self) {
        if self.status != ConnectionStatus::Disconnected {
            info!("Disconnected from server");
        }
        self.status = ConnectionStatus::Disconnected;
        self.outgoing.clear();
    }

    /// Reconcile with an authoritative server message
    pub fn apply(&mut self, msg: ServerMsg) {
        if self.status == ConnectionStatus::Disconnected {
            return;
        }

        match msg {
            ServerMsg::Init { slot } => match slot.slot() {
                None => {
                    self.local_slot = None;
                    self.queued = true;
                    self.status = ConnectionStatus::WaitingForOpponent;
                    info!("Server full, waiting for a free slot");
                }
                Some(slot) => {
                    self.local_slot = Some(slot);
                    self.queued = false;
                    self.status = ConnectionStatus::WaitingForOpponent;
                    self.reset_round();
                    info!(slot = ?slot, "Assigned slot");
                    self.send_local_pose();
                }
            },
            ServerMsg::Ready => {
                self.status = ConnectionStatus::Active;
                self.loser = None;
                self.bullets.clear();
                self.reset_health();
            }
            ServerMsg::PlayerLeft => {
                self.status = ConnectionStatus::WaitingForOpponent;
                self.bullets.clear();
                self.shield = false;
                self.loser = None;
                if let Some(local) = self.local_slot {
                    let remote = local.opponent();
                    self.ships[remote.index()] = Ship::spawn(remote, &self.config);
                }
                self.reset_health();
            }
            ServerMsg::Move { slot, position } => {
                if Some(slot) == self.local_slot {
                    // our own prediction already holds this pose
                    debug!(slot = ?slot, "Ignoring echo of local move");
                } else {
                    self.ships[slot.index()].set_pose(position);
                }
            }
            ServerMsg::Bullets {
                bullets,
                p1_health,
                p2_health,
            } => {
                self.bullets = bullets;
                self.ships[Slot::P1.index()].health = p1_health;
                self.ships[Slot::P2.index()].health = p2_health;
            }
            ServerMsg::Death { slot } => {
                self.status = ConnectionStatus::GameOver;
                self.loser = Some(slot);
                self.shield = false;
                info!(slot = ?slot, "Round over");
            }
            ServerMsg::Restart => {
                self.status = ConnectionStatus::Active;
                self.reset_round();
                self.send_local_pose();
            }
        }
    }

    /// Apply a local intent immediately, queueing whatever the server must hear
    pub fn on_intent(&mut self, intent: Intent) {
        let Some(slot) = self.local_slot else {
            return;
        };
        if self.status == ConnectionStatus::Disconnected {
            return;
        }

        let step = self.config.move_step;
        let turn = self.config.turn_step;
        let ship = &mut self.ships[slot.index()];

        match intent {
            Intent::Left => ship.translate(-step, 0.0),
            Intent::Right => ship.translate(step, 0.0),
            Intent::Up => ship.translate(0.0, -step),
            Intent::Down => ship.translate(0.0, step),
            Intent::RotateLeft => ship.rotate(turn),
            Intent::RotateRight => ship.rotate(-turn),
            Intent::Fire => {
                if self.status == ConnectionStatus::Active {
                    self.outgoing.push(ClientMsg::Fire);
                }
                return;
            }
            Intent::Shield => {
                if self.status == ConnectionStatus::Active {
                    self.shield = !self.shield;
                }
                return;
            }
            Intent::Restart => {
                if self.status == ConnectionStatus::GameOver {
                    self.outgoing.push(ClientMsg::Restart);
                }
                return;
            }
        }

        self.send_local_pose();
    }

    /// Messages queued for the server since the last call
    pub fn take_outgoing(&mut self) -> Vec<ClientMsg> {
        std::mem::take(&mut self.outgoing)
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn local_slot(&self) -> Option<Slot> {
        self.local_slot
    }

    pub fn is_queued(&self) -> bool {
        self.queued
    }

    pub fn ship(&self, slot: Slot) -> &Ship {
        &self.ships[slot.index()]
    }

    pub fn bullets(&self) -> &[BulletView] {
        &self.bullets
    }

    pub fn shield_active(&self) -> bool {
        self.shield
    }

    pub fn loser(&self) -> Option<Slot> {
        self.loser
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    fn send_local_pose(&mut self) {
        if let Some(slot) = self.local_slot {
            self.outgoing.push(ClientMsg::Move {
                slot,
                position: self.ships[slot.index()].pose(),
            });
        }
    }

    fn reset_round(&mut self) {
        for slot in Slot::ALL {
            self.ships[slot.index()] = Ship::spawn(slot, &self.config);
        }
        self.bullets.clear();
        self.shield = false;
        self.loser = None;
    }

    fn reset_health(&mut self) {
        for ship in &mut self.ships {
            ship.reset_health(self.config.max_health);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::{InitSlot, Pose};

    fn active_p1() -> ClientState {
        let mut state = ClientState::new(GameConfig::default());
        state.on_connected();
        state.apply(ServerMsg::Init { slot: InitSlot::P1 });
        state.apply(ServerMsg::Ready);
        state.take_outgoing();
        state
    }

    #[test]
    fn lifecycle_reaches_active() {
        let mut state = ClientState::new(GameConfig::default());
        assert_eq!(state.status(), ConnectionStatus::Connecting);
        state.on_connected();
        assert_eq!(state.status(), ConnectionStatus::Connected);

        state.apply(ServerMsg::Init { slot: InitSlot::P2 });
        assert_eq!(state.status(), ConnectionStatus::WaitingForOpponent);
        assert_eq!(state.local_slot(), Some(Slot::P2));
        // announces its spawn pose once
        assert_eq!(
            state.take_outgoing(),
            vec![ClientMsg::Move {
                slot: Slot::P2,
                position: state.ship(Slot::P2).pose()
            }]
        );

        state.apply(ServerMsg::Ready);
        assert_eq!(state.status(), ConnectionStatus::Active);
    }

    #[test]
    fn local_input_is_predicted_and_sent() {
        let mut state = active_p1();
        let start = state.ship(Slot::P1).pose();

        state.on_intent(Intent::Right);
        state.on_intent(Intent::RotateLeft);

        let pose = state.ship(Slot::P1).pose();
        assert_eq!(pose.x, start.x + 5.0);
        assert_eq!(pose.angle, 5.0);

        let sent = state.take_outgoing();
        assert_eq!(sent.len(), 2);
        assert_eq!(
            sent[1],
            ClientMsg::Move {
                slot: Slot::P1,
                position: pose
            }
        );
    }

    #[test]
    fn echo_of_local_move_does_not_fight_prediction() {
        let mut state = active_p1();
        state.on_intent(Intent::Down);
        let predicted = state.ship(Slot::P1).pose();

        state.apply(ServerMsg::Move {
            slot: Slot::P1,
            position: Pose {
                x: 0.0,
                y: 0.0,
                angle: 90.0,
            },
        });
        assert_eq!(state.ship(Slot::P1).pose(), predicted);
    }

    #[test]
    fn remote_move_replaces_remote_ship() {
        let mut state = active_p1();
        let position = Pose {
            x: 600.0,
            y: 100.0,
            angle: 200.0,
        };
        state.apply(ServerMsg::Move {
            slot: Slot::P2,
            position,
        });
        assert_eq!(state.ship(Slot::P2).pose(), position);
        assert_eq!(state.ship(Slot::P2).history().count(), 1);
    }

    #[test]
    fn bullets_update_replaces_view_and_health() {
        let mut state = active_p1();
        let bullet = BulletView {
            x: 10.0,
            y: 20.0,
            angle: 0.0,
            owner: Slot::P1,
        };
        state.apply(ServerMsg::Bullets {
            bullets: vec![bullet, bullet],
            p1_health: 150,
            p2_health: 90,
        });
        state.apply(ServerMsg::Bullets {
            bullets: vec![bullet],
            p1_health: 150,
            p2_health: 80,
        });
        assert_eq!(state.bullets(), &[bullet]);
        assert_eq!(state.ship(Slot::P2).health, 80);
        assert_eq!(state.ship(Slot::P1).health, 150);
    }

    #[test]
    fn game_over_freezes_fire_and_shield_but_not_movement() {
        let mut state = active_p1();
        state.apply(ServerMsg::Death { slot: Slot::P2 });
        assert_eq!(state.status(), ConnectionStatus::GameOver);
        assert_eq!(state.loser(), Some(Slot::P2));

        state.on_intent(Intent::Fire);
        state.on_intent(Intent::Shield);
        assert!(state.take_outgoing().is_empty());
        assert!(!state.shield_active());

        state.on_intent(Intent::Up);
        assert!(matches!(
            state.take_outgoing().as_slice(),
            [ClientMsg::Move { .. }]
        ));

        state.on_intent(Intent::Restart);
        assert_eq!(state.take_outgoing(), vec![ClientMsg::Restart]);
    }

    #[test]
    fn restart_resets_display_and_resumes() {
        let config = GameConfig::default();
        let mut state = active_p1();
        state.on_intent(Intent::Left);
        state.apply(ServerMsg::Bullets {
            bullets: Vec::new(),
            p1_health: 0,
            p2_health: 40,
        });
        state.apply(ServerMsg::Death { slot: Slot::P1 });
        state.take_outgoing();

        state.apply(ServerMsg::Restart);
        assert_eq!(state.status(), ConnectionStatus::Active);
        assert_eq!(state.ship(Slot::P1).health, config.max_health);
        assert_eq!(state.ship(Slot::P2).health, config.max_health);
        assert_eq!(state.ship(Slot::P1).pose(), Ship::spawn(Slot::P1, &config).pose());
        assert_eq!(state.loser(), None);
        assert!(matches!(
            state.take_outgoing().as_slice(),
            [ClientMsg::Move { slot: Slot::P1, .. }]
        ));
    }

    #[test]
    fn full_then_promoted() {
        let mut state = ClientState::new(GameConfig::default());
        state.on_connected();
        state.apply(ServerMsg::Init {
            slot: InitSlot::Full,
        });
        assert!(state.is_queued());
        assert_eq!(state.local_slot(), None);

        // no slot yet, so input goes nowhere
        state.on_intent(Intent::Right);
        assert!(state.take_outgoing().is_empty());

        state.apply(ServerMsg::Init { slot: InitSlot::P1 });
        assert!(!state.is_queued());
        assert_eq!(state.local_slot(), Some(Slot::P1));
    }

    #[test]
    fn player_left_returns_to_waiting() {
        let mut state = active_p1();
        state.apply(ServerMsg::PlayerLeft);
        assert_eq!(state.status(), ConnectionStatus::WaitingForOpponent);
        state.on_intent(Intent::Fire);
        assert!(state.take_outgoing().is_empty());
    }

    #[test]
    fn disconnected_is_terminal() {
        let mut state = active_p1();
        state.on_disconnected();
        state.apply(ServerMsg::Ready);
        state.on_intent(Intent::Right);
        assert_eq!(state.status(), ConnectionStatus::Disconnected);
        assert!(state.take_outgoing().is_empty());
    }
}
