//! Room registry: one room per chat, each watched by a supervisor.
//!
//! ```text
//!   new_game ──► spawn_room ──► RoomActor task
//!       │                          │ done / cancel
//!       └──────► supervise ◄───────┘
//!                    │
//!                    └─► RoomClosed ──► next_closed() reaps the entry
//! ```
//!
//! The supervisor races the actor's completion against the room timeout.
//! Whichever way the room ends, the registry hears about it on one channel
//! and drops the entry, but only if it still belongs to the same room.
//! On timeout the supervisor marks the room `End` itself and gives the
//! actor a short grace period to stop, so a room stuck on a platform send
//! still leaves the registry.
//!
//! Nothing here waits on a room: commands are queued with `try_send`, so a
//! stalled room can't hold up the engine or any other chat.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use jasoos_dispatch::DispatchSender;
use jasoos_protocol::{CallbackAction, Chat, ChatId, MessageRef};
use tokio::sync::{mpsc, oneshot, watch};

use crate::room::{RoomOutcome, RoomSetup, spawn_room};
use crate::{Member, RoomConfig, RoomError, RoomHandle, RoomId, RoomState};

static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// How long a timed-out room gets to stop before it is reported closed.
const CANCEL_GRACE: Duration = Duration::from_secs(5);

/// Why a room left the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The result was announced.
    Finished,
    /// The room outlived its timeout and was cancelled.
    TimedOut,
    /// The actor stopped without finishing.
    Abandoned,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::Finished => write!(f, "finished"),
            CloseReason::TimedOut => write!(f, "timed out"),
            CloseReason::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// Sent by a room's supervisor once the room has stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomClosed {
    pub chat_id: ChatId,
    pub room_id: RoomId,
    pub reason: CloseReason,
}

/// What `/newgame` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewGame {
    /// A fresh room was spawned.
    Created(RoomId),
    /// The chat's room was waiting on a blocked creator; it retried with
    /// the new sender.
    Retried(RoomId),
}

impl NewGame {
    pub fn room_id(&self) -> RoomId {
        match self {
            NewGame::Created(id) | NewGame::Retried(id) => *id,
        }
    }
}

/// Tracks the running room of every chat.
///
/// Owned by a single task (the engine); rooms themselves run elsewhere, so
/// nothing here needs a lock.
pub struct RoomRegistry {
    rooms: HashMap<ChatId, RoomHandle>,
    words: Arc<[String]>,
    config: RoomConfig,
    dispatch: DispatchSender,
    closed_tx: mpsc::UnboundedSender<RoomClosed>,
    closed_rx: mpsc::UnboundedReceiver<RoomClosed>,
}

impl RoomRegistry {
    pub fn new(words: Vec<String>, config: RoomConfig, dispatch: DispatchSender) -> Self {
        let (closed_tx, closed_rx) = mpsc::unbounded_channel();
        Self {
            rooms: HashMap::new(),
            words: words.into(),
            config,
            dispatch,
            closed_tx,
            closed_rx,
        }
    }

    /// Handles `/newgame` from `creator` in `chat`.
    ///
    /// Spawns a room unless one is already running there. A room stuck on a
    /// blocked creator is retried with `creator` instead. A room that has
    /// ended but not been reaped yet is replaced.
    pub fn new_game(&mut self, chat: &Chat, creator: Member) -> Result<NewGame, RoomError> {
        if let Some(handle) = self.rooms.get(&chat.id) {
            match handle.state() {
                RoomState::End => {}
                _ if handle.is_closed() => {}
                RoomState::CreatorBlocked => {
                    let room_id = handle.room_id();
                    handle.retry_creator(creator)?;
                    tracing::info!(%room_id, chat_id = %chat.id, "creator retried");
                    return Ok(NewGame::Retried(room_id));
                }
                state => {
                    return Err(RoomError::AlreadyRunning {
                        chat_id: chat.id,
                        state,
                    });
                }
            }
        }

        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let spawned = spawn_room(
            RoomSetup {
                room_id,
                chat_id: chat.id,
                chat_title: chat.title().to_string(),
                creator,
                words: Arc::clone(&self.words),
                config: self.config.clone(),
                dispatch: self.dispatch.clone(),
            },
            DEFAULT_CHANNEL_SIZE,
        );

        tokio::spawn(supervise(
            room_id,
            chat.id,
            spawned.done,
            spawned.cancel,
            spawned.state,
            self.config.room_timeout(),
            self.closed_tx.clone(),
        ));

        if let Some(old) = self.rooms.insert(chat.id, spawned.handle) {
            tracing::debug!(old = %old.room_id(), chat_id = %chat.id, "replaced ended room");
        }
        tracing::info!(%room_id, chat_id = %chat.id, "room created");
        Ok(NewGame::Created(room_id))
    }

    /// Routes a button press in `chat_id` to that chat's room.
    ///
    /// Never waits: the command is queued and the room applies it in turn.
    /// A room with a full queue refuses it with [`RoomError::Busy`].
    pub fn route_callback(
        &self,
        chat_id: ChatId,
        from: Member,
        message: MessageRef,
        data: &str,
    ) -> Result<(), RoomError> {
        let action: CallbackAction = data.parse()?;
        let handle = self
            .rooms
            .get(&chat_id)
            .ok_or(RoomError::NotFound(chat_id))?;

        match action {
            CallbackAction::Join => handle.join(from, message),
            CallbackAction::Vote(target) => handle.vote(from, target, message),
        }
    }

    /// Waits for the next room to close and drops it from the registry.
    pub async fn next_closed(&mut self) -> Option<RoomClosed> {
        let closed = self.closed_rx.recv().await?;
        self.reap(&closed);
        Some(closed)
    }

    /// Removes the entry `closed` refers to. Returns `false` when the chat
    /// already holds a newer room.
    pub fn reap(&mut self, closed: &RoomClosed) -> bool {
        let current = self.rooms.get(&closed.chat_id).map(RoomHandle::room_id);
        if current != Some(closed.room_id) {
            tracing::debug!(
                room_id = %closed.room_id,
                chat_id = %closed.chat_id,
                "stale close notice ignored"
            );
            return false;
        }
        self.rooms.remove(&closed.chat_id);
        tracing::info!(
            room_id = %closed.room_id,
            chat_id = %closed.chat_id,
            reason = %closed.reason,
            "room removed"
        );
        true
    }

    pub fn room(&self, chat_id: ChatId) -> Option<&RoomHandle> {
        self.rooms.get(&chat_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn chat_ids(&self) -> Vec<ChatId> {
        self.rooms.keys().copied().collect()
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }
}

/// Watches one room until it stops, cancelling it if it outlives `timeout`.
///
/// A timed-out room is reported closed after at most [`CANCEL_GRACE`],
/// whether or not its actor ever answers the cancel.
async fn supervise(
    room_id: RoomId,
    chat_id: ChatId,
    mut done: oneshot::Receiver<RoomOutcome>,
    cancel: oneshot::Sender<()>,
    state: Arc<watch::Sender<RoomState>>,
    timeout: Duration,
    closed: mpsc::UnboundedSender<RoomClosed>,
) {
    let reason = tokio::select! {
        outcome = &mut done => match outcome {
            Ok(RoomOutcome::Finished) => CloseReason::Finished,
            Ok(RoomOutcome::Cancelled) => CloseReason::TimedOut,
            Ok(RoomOutcome::Abandoned) | Err(_) => CloseReason::Abandoned,
        },
        _ = tokio::time::sleep(timeout) => {
            tracing::warn!(%room_id, %chat_id, ?timeout, "room timed out, cancelling");
            let _ = cancel.send(());
            state.send_replace(RoomState::End);
            if tokio::time::timeout(CANCEL_GRACE, &mut done).await.is_err() {
                tracing::warn!(%room_id, %chat_id, "room did not stop after cancel, dropping it");
            }
            CloseReason::TimedOut
        }
    };

    if closed
        .send(RoomClosed {
            chat_id,
            room_id,
            reason,
        })
        .is_err()
    {
        tracing::debug!(%room_id, "registry gone before room closed");
    }
}
