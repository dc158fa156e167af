//! Slot assignment and the wait queue

pub mod queue;
pub mod registry;

pub use registry::{
    Admission, Assignment, Departure, MatchRegistry, Participant, ParticipantId, RegistryError,
};
