//! Match registry - the two active slots plus the wait queue

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::game::physics::Ship;
use crate::ws::protocol::{InitSlot, ServerMsg, Slot};

use super::queue::WaitQueue;

pub type ParticipantId = Uuid;

/// One network-connected actor
#[derive(Debug)]
pub struct Participant {
    pub id: ParticipantId,
    /// `None` while waiting
    pub slot: Option<Slot>,
    /// Replaced with the slot's spawn ship on assignment
    pub ship: Ship,
    outbox: mpsc::UnboundedSender<ServerMsg>,
}

impl Participant {
    pub fn new(
        id: ParticipantId,
        outbox: mpsc::UnboundedSender<ServerMsg>,
        config: &GameConfig,
    ) -> Self {
        Self {
            id,
            slot: None,
            ship: Ship::spawn(Slot::P1, config),
            outbox,
        }
    }

    /// Queue a message for this participant's socket writer
    pub fn send(&self, msg: ServerMsg) {
        if self.outbox.send(msg).is_err() {
            // the reader side reports the disconnect
            debug!(participant_id = %self.id, "Outbox closed, dropping message");
        }
    }
}

/// How a connect was admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Assigned(Assignment),
    /// Queued at this 1-based position
    Queued(usize),
}

/// Result of filling a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub slot: Slot,
    /// Filling this slot completed the pair
    pub match_ready: bool,
}

/// Result of a disconnect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Departure {
    pub vacated: Option<Slot>,
    pub promoted: Option<Assignment>,
}

/// Slot-assignment invariant violations; there is no recovery from these
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("no open slot for participant {0}")]
    NoOpenSlot(ParticipantId),

    #[error("participant {0} is already registered")]
    Duplicate(ParticipantId),
}

/// Owns slot assignment and vacancy backfill
#[derive(Debug)]
pub struct MatchRegistry {
    config: GameConfig,
    slots: [Option<Participant>; 2],
    queue: WaitQueue,
    ready: bool,
}

impl MatchRegistry {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            slots: [None, None],
            queue: WaitQueue::new(),
            ready: false,
        }
    }

    /// Admit a new participant: first open slot, else the tail of the queue
    pub fn connect(&mut self, participant: Participant) -> Result<Admission, RegistryError> {
        if self.contains(participant.id) {
            return Err(RegistryError::Duplicate(participant.id));
        }

        if self.slots.iter().all(Option::is_some) {
            let id = participant.id;
            participant.send(ServerMsg::Init {
                slot: InitSlot::Full,
            });
            let position = self.queue.enqueue(participant);
            info!(participant_id = %id, position, "Server full, participant queued");
            return Ok(Admission::Queued(position));
        }

        self.assign_slot(participant).map(Admission::Assigned)
    }

    /// Remove a participant; a vacated slot is backfilled from the queue head
    pub fn disconnect(&mut self, id: ParticipantId) -> Result<Departure, RegistryError> {
        let Some(slot) = self.slot_of(id) else {
            if let Some(queued) = self.queue.remove(id) {
                info!(
                    participant_id = %id,
                    waited_ms = queued.wait_time().as_millis() as u64,
                    "Waiting participant left"
                );
            } else {
                warn!(participant_id = %id, "Disconnect for unknown participant");
            }
            return Ok(Departure::default());
        };

        self.slots[slot.index()] = None;
        self.ready = false;
        info!(participant_id = %id, slot = ?slot, "Active participant left");

        if let Some(remaining) = &self.slots[slot.opponent().index()] {
            remaining.send(ServerMsg::PlayerLeft);
        }

        let promoted = match self.queue.pop_front() {
            Some(next) => {
                info!(
                    participant_id = %next.participant.id,
                    waited_ms = next.wait_time().as_millis() as u64,
                    "Promoting waiting participant"
                );
                Some(self.assign_slot(next.participant)?)
            }
            None => None,
        };

        Ok(Departure {
            vacated: Some(slot),
            promoted,
        })
    }

    /// Seat a participant in the first open slot, P1 before P2
    fn assign_slot(&mut self, mut participant: Participant) -> Result<Assignment, RegistryError> {
        let slot = Slot::ALL
            .into_iter()
            .find(|s| self.slots[s.index()].is_none())
            .ok_or(RegistryError::NoOpenSlot(participant.id))?;

        participant.slot = Some(slot);
        participant.ship = Ship::spawn(slot, &self.config);
        participant.send(ServerMsg::Init { slot: slot.into() });
        info!(participant_id = %participant.id, slot = ?slot, "Slot assigned");
        self.slots[slot.index()] = Some(participant);

        let match_ready = self.slots.iter().all(Option::is_some);
        if match_ready {
            self.start_pairing(slot);
        }

        Ok(Assignment { slot, match_ready })
    }

    /// Both slots just filled: sync poses, announce. The round itself
    /// (health, bullets) is reset by the match state.
    fn start_pairing(&mut self, newcomer: Slot) {
        let incumbent = newcomer.opponent();
        if let (Some(new), Some(old)) = (
            &self.slots[newcomer.index()],
            &self.slots[incumbent.index()],
        ) {
            new.send(ServerMsg::Move {
                slot: incumbent,
                position: old.ship.pose(),
            });
            old.send(ServerMsg::Move {
                slot: newcomer,
                position: new.ship.pose(),
            });
        }

        self.ready = true;
        self.broadcast(ServerMsg::Ready);
        info!("Both slots filled, match ready");
    }

    /// Send to every active participant
    pub fn broadcast(&self, msg: ServerMsg) {
        for seat in self.slots.iter().flatten() {
            seat.send(msg.clone());
        }
    }

    pub fn send_to(&self, slot: Slot, msg: ServerMsg) {
        if let Some(seat) = &self.slots[slot.index()] {
            seat.send(msg);
        }
    }

    pub fn slot_of(&self, id: ParticipantId) -> Option<Slot> {
        Slot::ALL.into_iter().find(|s| {
            self.slots[s.index()]
                .as_ref()
                .is_some_and(|p| p.id == id)
        })
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.slot_of(id).is_some() || self.queue.contains(id)
    }

    pub fn participant(&self, slot: Slot) -> Option<&Participant> {
        self.slots[slot.index()].as_ref()
    }

    pub fn participant_mut(&mut self, slot: Slot) -> Option<&mut Participant> {
        self.slots[slot.index()].as_mut()
    }

    /// Both ships, P1 first, when both slots are filled
    pub fn ships_mut(&mut self) -> Option<[&mut Ship; 2]> {
        match &mut self.slots {
            [Some(p1), Some(p2)] => Some([&mut p1.ship, &mut p2.ship]),
            _ => None,
        }
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Battle can only be active while both slots are filled
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready && self.is_full();
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn waiting_count(&self) -> usize {
        self.queue.len()
    }

    pub fn waiting_ids(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.queue.ids()
    }
}
