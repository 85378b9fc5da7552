//! The dispatch channel and its single consumer.
//!
//! ```text
//! room A ─┐
//! room B ─┼─► mpsc::Sender<Request> ─► Dispatcher::run ─► Platform::send
//! room C ─┘                                   │
//!                                             └─► oneshot report (optional)
//! ```
//!
//! One consumer means sends are strictly sequential: whatever order a room
//! emits its requests in is the order the platform sees them.

use jasoos_protocol::{Chattable, SentMessage};
use tokio::sync::{mpsc, oneshot};

use crate::{DispatchError, Platform, PlatformError};

/// Default bound of the request channel. Producers wait when it is full.
pub const DEFAULT_CAPACITY: usize = 256;

/// One outbound operation, optionally with a channel for its outcome.
#[derive(Debug)]
pub struct Request {
    pub chattable: Chattable,
    /// If present, the dispatcher posts exactly one [`Response`] here after
    /// attempting the send, success or failure.
    pub report: Option<oneshot::Sender<Response>>,
}

/// Outcome of one attempted send.
#[derive(Debug, Clone)]
pub struct Response {
    pub result: Result<SentMessage, PlatformError>,
}

impl Response {
    pub fn into_result(self) -> Result<SentMessage, PlatformError> {
        self.result
    }
}

/// Creates the dispatch channel: a cloneable producer handle and the
/// consumer that must be spawned (`tokio::spawn(dispatcher.run())`).
pub fn channel<P: Platform>(platform: P, capacity: usize) -> (DispatchSender, Dispatcher<P>) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        DispatchSender { sender: tx },
        Dispatcher {
            platform,
            receiver: rx,
        },
    )
}

// ---------------------------------------------------------------------------
// Producer side
// ---------------------------------------------------------------------------

/// Handle for emitting outbound operations.
///
/// Cheap to clone; every room holds one. The channel stays open as long as
/// any clone is alive, so a finished room never closes it for the others.
#[derive(Clone, Debug)]
pub struct DispatchSender {
    sender: mpsc::Sender<Request>,
}

impl DispatchSender {
    /// Queues an operation without waiting for its outcome.
    pub async fn post(&self, chattable: impl Into<Chattable>) -> Result<(), DispatchError> {
        self.sender
            .send(Request {
                chattable: chattable.into(),
                report: None,
            })
            .await
            .map_err(|_| DispatchError::Closed)
    }

    /// Queues an operation and waits until the dispatcher has attempted it.
    pub async fn deliver(
        &self,
        chattable: impl Into<Chattable>,
    ) -> Result<SentMessage, DispatchError> {
        let (report_tx, report_rx) = oneshot::channel();
        self.sender
            .send(Request {
                chattable: chattable.into(),
                report: Some(report_tx),
            })
            .await
            .map_err(|_| DispatchError::Closed)?;
        let response = report_rx.await.map_err(|_| DispatchError::Closed)?;
        Ok(response.into_result()?)
    }

    /// Queues a raw request. The caller owns the report channel, if any.
    pub async fn submit(&self, request: Request) -> Result<(), DispatchError> {
        self.sender
            .send(request)
            .await
            .map_err(|_| DispatchError::Closed)
    }

    /// Returns `true` once the dispatcher has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

// ---------------------------------------------------------------------------
// Consumer side
// ---------------------------------------------------------------------------

/// The single sender loop.
pub struct Dispatcher<P: Platform> {
    platform: P,
    receiver: mpsc::Receiver<Request>,
}

impl<P: Platform> Dispatcher<P> {
    /// Drains the channel in arrival order until every producer is dropped.
    ///
    /// A failed send is logged and reported; it never stops the loop.
    pub async fn run(mut self) {
        tracing::info!("dispatcher started");
        let mut sent: u64 = 0;
        let mut failed: u64 = 0;

        while let Some(Request { chattable, report }) = self.receiver.recv().await {
            let result = self.platform.send(&chattable).await;

            match &result {
                Ok(msg) => {
                    sent += 1;
                    tracing::trace!(
                        chat_id = %msg.chat_id,
                        message_id = %msg.message_id,
                        "sent"
                    );
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        chat_id = %chattable.chat_id(),
                        error = %e,
                        "cannot send message"
                    );
                }
            }

            if let Some(report) = report {
                // The caller may have given up waiting; that's fine.
                let _ = report.send(Response { result });
            }
        }

        tracing::info!(sent, failed, "dispatcher stopped");
    }
}
