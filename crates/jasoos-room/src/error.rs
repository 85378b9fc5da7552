//! Error types for the room layer.

use jasoos_protocol::{ChatId, ProtocolError};

use crate::{RoomId, RoomState};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room is running in this chat.
    #[error("no room in chat {0}")]
    NotFound(ChatId),

    /// A game is already underway in this chat.
    #[error("chat {chat_id} already has a game in state {state}")]
    AlreadyRunning { chat_id: ChatId, state: RoomState },

    /// The room's command channel is closed; its actor has stopped.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),

    /// The room's command queue is full; the command was dropped.
    #[error("room {0} is busy")]
    Busy(RoomId),

    /// The callback payload could not be understood.
    #[error(transparent)]
    Callback(#[from] ProtocolError),
}
