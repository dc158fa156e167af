//! Match state and authoritative tick loop

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::GameConfig;
use crate::matchmaking::{Admission, MatchRegistry, Participant, ParticipantId, RegistryError};
use crate::ws::protocol::{ClientMsg, ProtocolError, ServerMsg, Slot};

use super::combat::CombatSimulator;
use super::physics::Ship;
use super::snapshot::cleared_bullets_update;
use super::ServerEvent;

/// Summary published for the health endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchStatus {
    pub active_players: usize,
    pub waiting_players: usize,
    pub ready: bool,
    pub game_over: bool,
}

/// All match state, mutated only by the tick loop
pub struct MatchState {
    config: GameConfig,
    registry: MatchRegistry,
    combat: CombatSimulator,
    game_over: bool,
    tick: u64,
}

impl MatchState {
    pub fn new(config: GameConfig) -> Self {
        Self {
            registry: MatchRegistry::new(config.clone()),
            combat: CombatSimulator::new(),
            config,
            game_over: false,
            tick: 0,
        }
    }

    /// Apply one transport event. Only invariant violations are returned.
    pub fn handle_event(&mut self, event: ServerEvent) -> Result<(), RegistryError> {
        match event {
            ServerEvent::Connected { id, outbox } => {
                self.connect(Participant::new(id, outbox, &self.config))?;
            }
            ServerEvent::Message { id, msg } => {
                let action = msg.action();
                if let Err(e) = self.handle_message(id, msg) {
                    warn!(participant_id = %id, action, error = %e, "Rejected client message");
                }
            }
            ServerEvent::Disconnected { id } => self.disconnect(id)?,
        }
        Ok(())
    }

    pub fn connect(&mut self, participant: Participant) -> Result<Admission, RegistryError> {
        let admission = self.registry.connect(participant)?;
        if let Admission::Assigned(assignment) = admission {
            if assignment.match_ready {
                self.start_round();
            }
        }
        Ok(admission)
    }

    pub fn disconnect(&mut self, id: ParticipantId) -> Result<(), RegistryError> {
        let departure = self.registry.disconnect(id)?;
        if let Some(slot) = departure.vacated {
            self.combat.clear(slot);
            self.game_over = false;
        }
        if departure.promoted.is_some_and(|a| a.match_ready) {
            self.start_round();
        }
        Ok(())
    }

    /// Dispatch a client message; refusals never affect the session
    pub fn handle_message(&mut self, id: ParticipantId, msg: ClientMsg) -> Result<(), ProtocolError> {
        let slot = self.sender_slot(id)?;

        match msg {
            ClientMsg::Move { slot: claimed, position } => {
                if claimed != slot {
                    return Err(ProtocolError::WrongSlot {
                        held: slot,
                        claimed,
                    });
                }
                if !position.is_finite() {
                    return Err(ProtocolError::NonFinite);
                }
                // No plausibility check: the client is trusted with its own pose
                if let Some(participant) = self.registry.participant_mut(slot) {
                    participant.ship.set_pose(position);
                }
                debug!(slot = ?slot, x = position.x, y = position.y, angle = position.angle, "Relaying move");
                self.registry
                    .send_to(slot.opponent(), ServerMsg::Move { slot, position });
                Ok(())
            }
            ClientMsg::Fire => {
                if !self.registry.is_ready() {
                    return Err(ProtocolError::NotReady("fire"));
                }
                if let Some(participant) = self.registry.participant(slot) {
                    self.combat.fire(slot, &participant.ship, &self.config);
                }
                Ok(())
            }
            ClientMsg::Restart => self.restart(slot),
        }
    }

    fn sender_slot(&self, id: ParticipantId) -> Result<Slot, ProtocolError> {
        match self.registry.slot_of(id) {
            Some(slot) => Ok(slot),
            None if self.registry.contains(id) => Err(ProtocolError::Unassigned),
            None => Err(ProtocolError::UnknownParticipant),
        }
    }

    fn restart(&mut self, requested_by: Slot) -> Result<(), ProtocolError> {
        if self.registry.is_ready() {
            return Err(ProtocolError::RoundInProgress);
        }
        if !self.registry.is_full() {
            return Err(ProtocolError::NotReady("restart"));
        }

        for slot in Slot::ALL {
            if let Some(participant) = self.registry.participant_mut(slot) {
                participant.ship = Ship::spawn(slot, &self.config);
            }
        }
        self.start_round();
        self.registry.broadcast(ServerMsg::Restart);
        info!(requested_by = ?requested_by, "Round restarted");
        Ok(())
    }

    /// Fresh round: full health, no bullets, battle active
    fn start_round(&mut self) {
        if let Some(ships) = self.registry.ships_mut() {
            for ship in ships {
                ship.reset_health(self.config.max_health);
            }
        }
        self.combat.clear_all();
        self.game_over = false;
        self.registry.set_ready(true);
        self.registry
            .broadcast(cleared_bullets_update(self.config.max_health));
    }

    /// One combat pass; does nothing unless the match is ready
    pub fn tick(&mut self) {
        if !self.registry.is_ready() {
            return;
        }
        self.tick += 1;

        let Some(ships) = self.registry.ships_mut() else {
            return;
        };
        let report = self.combat.step(ships, &self.config);

        if let Some(update) = report.update {
            self.registry.broadcast(update);
        }

        if !report.deaths.is_empty() {
            for slot in &report.deaths {
                info!(tick = self.tick, slot = ?slot, "Ship destroyed");
                self.registry.broadcast(ServerMsg::Death { slot: *slot });
            }
            self.registry.set_ready(false);
            self.game_over = true;
        }
    }

    pub fn status(&self) -> MatchStatus {
        MatchStatus {
            active_players: self.registry.active_count(),
            waiting_players: self.registry.waiting_count(),
            ready: self.registry.is_ready(),
            game_over: self.game_over,
        }
    }

    pub fn registry(&self) -> &MatchRegistry {
        &self.registry
    }

    pub fn combat(&self) -> &CombatSimulator {
        &self.combat
    }

    pub fn is_ready(&self) -> bool {
        self.registry.is_ready()
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn ship(&self, slot: Slot) -> Option<&Ship> {
        self.registry.participant(slot).map(|p| &p.ship)
    }
}

/// Handle held by socket tasks and the health endpoint
#[derive(Clone)]
pub struct ServerHandle {
    pub events_tx: mpsc::Sender<ServerEvent>,
    pub status_rx: watch::Receiver<MatchStatus>,
}

/// The authoritative game server
pub struct GameServer {
    state: MatchState,
    events_rx: mpsc::Receiver<ServerEvent>,
    status_tx: watch::Sender<MatchStatus>,
}

impl GameServer {
    pub fn new(config: GameConfig) -> (Self, ServerHandle) {
        let (events_tx, events_rx) = mpsc::channel(256);
        let (status_tx, status_rx) = watch::channel(MatchStatus::default());

        let server = Self {
            state: MatchState::new(config),
            events_rx,
            status_tx,
        };
        let handle = ServerHandle {
            events_tx,
            status_rx,
        };
        (server, handle)
    }

    /// Run the tick loop: pump events, simulate, sleep. Returns when every
    /// event sender is gone, or with the first invariant violation.
    pub async fn run(mut self) -> Result<(), RegistryError> {
        let tick_interval = self.state.config.tick_interval;
        info!(tick_ms = tick_interval.as_millis() as u64, "Game loop started");

        let mut ticker = interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            if !self.pump_events()? {
                info!("Event channel closed, stopping game loop");
                return Ok(());
            }

            self.state.tick();
            self.status_tx.send_if_modified(|status| {
                let next = self.state.status();
                let changed = *status != next;
                *status = next;
                changed
            });
        }
    }

    /// Drain pending events without blocking; false once the channel is closed
    fn pump_events(&mut self) -> Result<bool, RegistryError> {
        loop {
            match self.events_rx.try_recv() {
                Ok(event) => {
                    if let Err(e) = self.state.handle_event(event) {
                        error!(error = %e, "Slot assignment invariant violated");
                        return Err(e);
                    }
                }
                Err(mpsc::error::TryRecvError::Empty) => return Ok(true),
                Err(mpsc::error::TryRecvError::Disconnected) => return Ok(false),
            }
        }
    }
}
