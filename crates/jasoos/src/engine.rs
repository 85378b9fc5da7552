//! The inbound loop.
//!
//! The engine is the single owner of the [`RoomRegistry`]. It consumes
//! platform updates one at a time and hands them to the registry, which
//! queues them on room actors without waiting, so a room stuck on a slow
//! send never holds up updates for other chats.
//! Between updates it reaps rooms their supervisors report as closed.

use jasoos_dispatch::{self as dispatch, DispatchSender, Platform};
use jasoos_protocol::{Command, Update};
use jasoos_room::{Member, NewGame, RoomRegistry};
use tokio::sync::mpsc;

use crate::JasoosError;
use crate::config::Config;

pub struct Engine {
    registry: RoomRegistry,
}

impl Engine {
    /// Creates an engine whose rooms send through `dispatch`.
    pub fn new(config: &Config, dispatch: DispatchSender) -> Self {
        Self {
            registry: RoomRegistry::new(config.words.clone(), config.room.clone(), dispatch),
        }
    }

    /// Creates an engine and spawns a dispatcher task in front of
    /// `platform`.
    pub fn with_platform<P: Platform>(config: &Config, platform: P) -> Self {
        let (sender, dispatcher) = dispatch::channel(platform, dispatch::DEFAULT_CAPACITY);
        tokio::spawn(dispatcher.run());
        Self::new(config, sender)
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Processes updates until the stream ends.
    ///
    /// Updates that can't be acted on are logged and skipped; they never
    /// stop the loop.
    pub async fn run(mut self, mut updates: mpsc::Receiver<Update>) -> Result<(), JasoosError> {
        tracing::info!("engine running");

        loop {
            tokio::select! {
                update = updates.recv() => match update {
                    Some(update) => {
                        if let Err(e) = self.handle(update) {
                            tracing::debug!(error = %e, "update ignored");
                        }
                    }
                    None => break,
                },
                Some(closed) = self.registry.next_closed() => {
                    tracing::debug!(
                        room_id = %closed.room_id,
                        chat_id = %closed.chat_id,
                        reason = %closed.reason,
                        rooms = self.registry.room_count(),
                        "room closed"
                    );
                }
            }
        }

        tracing::info!(
            rooms = self.registry.room_count(),
            "update stream ended, engine stopping"
        );
        Ok(())
    }

    /// Applies one update.
    pub fn handle(&mut self, update: Update) -> Result<(), JasoosError> {
        if !update.chat().is_group() {
            tracing::debug!(chat_id = %update.chat().id, "not a group chat");
            return Ok(());
        }

        match update {
            Update::Command { chat, from, text } => match Command::parse(&text)? {
                Command::NewGame => {
                    let outcome = self.registry.new_game(&chat, Member::from(&from))?;
                    match outcome {
                        NewGame::Created(room_id) => {
                            tracing::debug!(%room_id, chat_id = %chat.id, user_id = %from.id, "new game");
                        }
                        NewGame::Retried(room_id) => {
                            tracing::debug!(%room_id, chat_id = %chat.id, user_id = %from.id, "creator retry");
                        }
                    }
                }
            },
            Update::Callback {
                chat,
                from,
                message,
                data,
            } => {
                self.registry
                    .route_callback(chat.id, Member::from(&from), message, &data)?;
            }
        }
        Ok(())
    }
}
