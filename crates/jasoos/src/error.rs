//! Unified error type for Jasoos.

use jasoos_protocol::ProtocolError;
use jasoos_room::RoomError;

use crate::config::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum JasoosError {
    /// A malformed command or callback payload.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error such as a missing or busy room.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
