//! Client core: local prediction, reconciliation and the render snapshot

pub mod connection;
pub mod input;
pub mod render;
pub mod state;

pub use connection::{ClientError, Connection, TransportEvent};
pub use input::{InputMap, InputTag, Intent};
pub use render::{RenderSnapshot, ShipView};
pub use state::{ClientState, ConnectionStatus};
