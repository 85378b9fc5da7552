/// Errors reported by a [`Platform`](crate::Platform) for a single operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    /// The recipient can't be messaged, typically because they never opened
    /// a private conversation with the bot, or blocked it.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The chat or message doesn't exist (anymore).
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other rejection from the platform API.
    #[error("api error {code}: {description}")]
    Api { code: i32, description: String },

    /// The request never got an answer.
    #[error("network error: {0}")]
    Network(String),
}

/// Errors a producer can observe when dispatching.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The platform rejected the operation.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// The dispatcher task is gone; nothing will be sent.
    #[error("dispatcher closed")]
    Closed,
}
