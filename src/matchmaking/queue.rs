//! FIFO of participants waiting for a slot

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::registry::{Participant, ParticipantId};

/// Participant in the wait queue
#[derive(Debug)]
pub struct QueuedParticipant {
    pub participant: Participant,
    pub queued_at: Instant,
}

impl QueuedParticipant {
    pub fn new(participant: Participant) -> Self {
        Self {
            participant,
            queued_at: Instant::now(),
        }
    }

    /// How long this participant has been waiting
    pub fn wait_time(&self) -> Duration {
        self.queued_at.elapsed()
    }
}

/// Strict FIFO; no priority and no reconnection affinity
#[derive(Debug, Default)]
pub struct WaitQueue {
    queue: VecDeque<QueuedParticipant>,
}

impl WaitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a participant at the tail
    pub fn enqueue(&mut self, participant: Participant) -> usize {
        self.queue.push_back(QueuedParticipant::new(participant));
        self.queue.len()
    }

    /// Take the head of the queue
    pub fn pop_front(&mut self) -> Option<QueuedParticipant> {
        self.queue.pop_front()
    }

    /// Remove a participant wherever it sits in the queue
    pub fn remove(&mut self, id: ParticipantId) -> Option<QueuedParticipant> {
        let pos = self.queue.iter().position(|q| q.participant.id == id)?;
        self.queue.remove(pos)
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.queue.iter().any(|q| q.participant.id == id)
    }

    /// Waiting ids, head first
    pub fn ids(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.queue.iter().map(|q| q.participant.id)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
