//! Error types for the protocol layer.
//!
//! Each crate in Jasoos defines its own error enum. A `ProtocolError` always
//! means the text coming from the platform could not be understood, never
//! that something went wrong while delivering it.

/// Errors that can occur while interpreting inbound text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The text is not a command this bot understands.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The callback payload doesn't match any known button action.
    ///
    /// Buttons from an older build, or hand-crafted payloads, end up here.
    #[error("malformed callback payload: {0:?}")]
    MalformedCallback(String),
}
