//! Identity types and inbound updates.
//!
//! Every value here arrives from the chat platform. The engine never
//! invents a `ChatId` or `UserId`; it only routes by them.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifier of a chat: a group, a supergroup, or a private conversation.
///
/// Newtype wrapper so a `ChatId` can't be passed where a `UserId` is
/// expected. `#[serde(transparent)]` keeps the JSON form a bare number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// Identifier of a platform user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U{}", self.0)
    }
}

/// A private conversation with a user has the same numeric id as the user.
/// Direct messages are addressed through this conversion.
impl From<UserId> for ChatId {
    fn from(user: UserId) -> Self {
        ChatId(user.0)
    }
}

/// Identifier of a message, unique within its chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i32);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// User and Chat
// ---------------------------------------------------------------------------

/// The sender of an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl User {
    /// Creates a user with only a first name.
    pub fn new(id: UserId, first_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: None,
            username: None,
        }
    }

    /// Sets the `username` handle.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// The name shown in group messages and on vote buttons.
    ///
    /// The username wins when present; otherwise first and last name.
    pub fn display_name(&self) -> String {
        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            return username.to_string();
        }
        match self.last_name.as_deref().filter(|l| !l.is_empty()) {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

/// What kind of conversation a chat is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

/// The chat an update came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    pub kind: ChatKind,
    #[serde(default)]
    pub title: Option<String>,
}

impl Chat {
    /// Creates a group chat with a title.
    pub fn group(id: ChatId, title: impl Into<String>) -> Self {
        Self {
            id,
            kind: ChatKind::Group,
            title: Some(title.into()),
        }
    }

    /// Games are only played in groups and supergroups.
    pub fn is_group(&self) -> bool {
        matches!(self.kind, ChatKind::Group | ChatKind::Supergroup)
    }

    /// The title, or an empty string for untitled chats.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Inbound updates
// ---------------------------------------------------------------------------

/// A message the bot previously sent, as seen from a button press on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub id: MessageId,
    #[serde(default)]
    pub text: String,
}

/// One inbound event from the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Update {
    /// A text message starting with `/`.
    Command { chat: Chat, from: User, text: String },

    /// An inline button press. `message` is the message carrying the button.
    Callback {
        chat: Chat,
        from: User,
        message: MessageRef,
        data: String,
    },
}

impl Update {
    /// The chat this update originates from.
    pub fn chat(&self) -> &Chat {
        match self {
            Self::Command { chat, .. } | Self::Callback { chat, .. } => chat,
        }
    }

    /// The user who produced this update.
    pub fn from(&self) -> &User {
        match self {
            Self::Command { from, .. } | Self::Callback { from, .. } => from,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_username() {
        let user = User::new(UserId(1), "Ali").with_username("ali_k");
        assert_eq!(user.display_name(), "ali_k");
    }

    #[test]
    fn test_display_name_joins_first_and_last() {
        let mut user = User::new(UserId(1), "Ali");
        user.last_name = Some("Karimi".into());
        assert_eq!(user.display_name(), "Ali Karimi");

        user.username = Some(String::new());
        assert_eq!(user.display_name(), "Ali Karimi");
    }

    #[test]
    fn test_private_chat_id_equals_user_id() {
        assert_eq!(ChatId::from(UserId(42)), ChatId(42));
    }

    #[test]
    fn test_only_groups_are_playable() {
        let mut chat = Chat::group(ChatId(-100), "friends");
        assert!(chat.is_group());
        chat.kind = ChatKind::Supergroup;
        assert!(chat.is_group());
        chat.kind = ChatKind::Private;
        assert!(!chat.is_group());
        chat.kind = ChatKind::Channel;
        assert!(!chat.is_group());
    }

    #[test]
    fn test_update_json_shape() {
        let json = r#"{
            "type": "callback",
            "chat": { "id": -5, "kind": "supergroup", "title": "t" },
            "from": { "id": 7, "first_name": "Sara" },
            "message": { "id": 12, "text": "A game created by x." },
            "data": "/join"
        }"#;
        let update: Update = serde_json::from_str(json).unwrap();
        assert_eq!(update.chat().id, ChatId(-5));
        assert_eq!(update.from().display_name(), "Sara");
        match update {
            Update::Callback { message, data, .. } => {
                assert_eq!(message.id, MessageId(12));
                assert_eq!(data, "/join");
            }
            other => panic!("expected callback, got {other:?}"),
        }
    }
}
