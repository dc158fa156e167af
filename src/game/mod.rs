//! Game simulation modules

pub mod combat;
pub mod r#match;
pub mod physics;
pub mod snapshot;

pub use r#match::{GameServer, MatchState, MatchStatus, ServerHandle};

use tokio::sync::mpsc;

use crate::matchmaking::ParticipantId;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Transport event forwarded from a socket task to the tick loop
#[derive(Debug)]
pub enum ServerEvent {
    /// A socket opened; `outbox` feeds its writer task
    Connected {
        id: ParticipantId,
        outbox: mpsc::UnboundedSender<ServerMsg>,
    },

    /// A parsed client message
    Message { id: ParticipantId, msg: ClientMsg },

    /// The socket closed or failed
    Disconnected { id: ParticipantId },
}
