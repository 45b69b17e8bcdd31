//! Errors raised by world commands

use super::entity::EntityId;

/// Command-level failures. None of these are fatal: the arena logs them and
/// treats the command as a no-op.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("No entity with id {0}")]
    UnknownEntity(EntityId),

    #[error("Entity {0} has already joined a team")]
    AlreadyJoined(EntityId),

    #[error("Invalid team index {0}")]
    InvalidTeam(u8),
}
