//! Protocol values for Jasoos.
//!
//! This crate defines the "language" the game engine and the chat platform
//! speak, without knowing anything about networking:
//!
//! - **Identities** ([`ChatId`], [`UserId`], [`MessageId`]) and the
//!   [`User`] / [`Chat`] records that arrive with every update.
//! - **Inbound** ([`Update`]): a command typed in a group or a button press.
//! - **Payloads** ([`Command`], [`CallbackAction`]): parsing and encoding
//!   of command strings and the opaque data carried by inline buttons.
//! - **Outbound** ([`Chattable`], [`SendMessage`], [`EditMessage`],
//!   [`InlineKeyboard`]): the operations handed to the platform.
//!
//! # Architecture
//!
//! ```text
//! Platform (updates) → Protocol (Update) → Engine → Room → Protocol (Chattable) → Dispatch
//! ```

mod error;
mod outbound;
mod payload;
mod types;

pub use error::ProtocolError;
pub use outbound::{
    Chattable, EditMessage, InlineButton, InlineKeyboard, SendMessage,
    SentMessage,
};
pub use payload::{CallbackAction, Command};
pub use types::{Chat, ChatId, ChatKind, MessageId, MessageRef, Update, User, UserId};
