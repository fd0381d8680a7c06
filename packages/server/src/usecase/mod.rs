//! UseCase layer: connection lifecycle and the per-event handlers.

pub mod channel;
pub mod connect_participant;
pub mod delivery;
pub mod disconnect_participant;
pub mod dispatcher;
pub mod error;
pub mod get_presence_snapshot;
pub mod message;
pub mod presence;
pub mod sweep_typing;
pub mod typing;
pub mod voice;

#[cfg(test)]
pub(crate) mod test_support;

pub use connect_participant::ConnectParticipantUseCase;
pub use delivery::{ConnectionContext, SharedState};
pub use disconnect_participant::{DisconnectParticipantUseCase, DisconnectReport};
pub use dispatcher::EventDispatcher;
pub use error::ConnectError;
pub use get_presence_snapshot::{GetPresenceSnapshotUseCase, PresenceSnapshot};
pub use sweep_typing::SweepExpiredTypingUseCase;
