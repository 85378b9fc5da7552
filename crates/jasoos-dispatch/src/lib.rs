//! Outbound message dispatch for Jasoos.
//!
//! Every send and edit in the process goes through one ordered channel and
//! is performed by a single [`Dispatcher`] task. Callers that need to know
//! whether a send reached its destination attach a report channel and wait
//! on it; everyone else fires and forgets.
//!
//! # Key types
//!
//! - [`Platform`]: the chat client that actually performs a [`Chattable`]
//! - [`Dispatcher`]: the single consumer that drains the channel
//! - [`DispatchSender`]: cheap cloneable handle producers hold
//! - [`Request`] / [`Response`]: the wire between the two
//! - [`MemoryPlatform`]: an in-process platform for tests and demos

mod dispatcher;
mod error;
mod memory;

use std::future::Future;

pub use dispatcher::{channel, DispatchSender, Dispatcher, Request, Response, DEFAULT_CAPACITY};
pub use error::{DispatchError, PlatformError};
pub use memory::{MemoryPlatform, StoredMessage};

use jasoos_protocol::{Chattable, SentMessage};

/// Performs outbound operations against the chat platform.
///
/// Implementations must be cheap to call repeatedly; the dispatcher calls
/// `send` once per request, strictly one at a time.
pub trait Platform: Send + Sync + 'static {
    /// Performs one send or edit and returns what the platform stored.
    fn send(
        &self,
        chattable: &Chattable,
    ) -> impl Future<Output = Result<SentMessage, PlatformError>> + Send;
}
