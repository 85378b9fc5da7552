//! # Jasoos
//!
//! A "who is the spy?" game for group chats.
//!
//! One member of the group is secretly the spy; everyone else privately
//! receives the same word. After a discussion the group votes, and the bot
//! reveals who the spy was.
//!
//! Every game runs in its own room actor, and every message the bot sends
//! goes through a single ordered dispatcher. The [`Engine`] feeds inbound
//! updates to the rooms.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jasoos::prelude::*;
//!
//! # async fn run() -> Result<(), JasoosError> {
//! jasoos::telemetry::init();
//! let config = Config::load(jasoos::config::DEFAULT_PATH)?;
//! let engine = Engine::with_platform(&config, MemoryPlatform::new());
//! let (_updates_tx, updates) = tokio::sync::mpsc::channel(64);
//! engine.run(updates).await
//! # }
//! ```

pub mod config;
mod engine;
mod error;
pub mod telemetry;

pub use engine::Engine;
pub use error::JasoosError;

pub mod prelude {
    pub use crate::config::{Config, ConfigError};
    pub use crate::{Engine, JasoosError};
    pub use jasoos_dispatch::{DispatchSender, MemoryPlatform, Platform, PlatformError};
    pub use jasoos_protocol::{
        CallbackAction, Chat, ChatId, ChatKind, Chattable, MessageId, MessageRef, SentMessage,
        Update, User, UserId,
    };
    pub use jasoos_room::{Member, RoomConfig, RoomState, VotePolicy};
}
