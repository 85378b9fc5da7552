//! An in-process [`Platform`] that keeps every message in memory.
//!
//! Used by the test suites and the console demo. It behaves like the real
//! platform in the ways the game cares about:
//!
//! - message ids are assigned per chat, starting at 1;
//! - a direct message to a *blocked* user fails with
//!   [`PlatformError::Forbidden`];
//! - editing a message that was never sent fails with
//!   [`PlatformError::NotFound`].

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use jasoos_protocol::{ChatId, Chattable, InlineKeyboard, MessageId, SentMessage, UserId};

use crate::{Platform, PlatformError};

/// A message as currently stored on the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub text: String,
    pub keyboard: Option<InlineKeyboard>,
    /// The text the message was first sent with, before any edit.
    pub original: String,
}

#[derive(Default)]
struct Inner {
    log: Vec<Chattable>,
    messages: HashMap<(ChatId, MessageId), StoredMessage>,
    next_id: HashMap<ChatId, i32>,
    blocked: HashSet<ChatId>,
}

/// In-memory platform. Clones share the same storage.
#[derive(Clone, Default)]
pub struct MemoryPlatform {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes direct messages to `user` fail, as if they never started the bot.
    pub fn block(&self, user: UserId) {
        self.lock().blocked.insert(user.into());
    }

    /// Lets direct messages to `user` through again.
    pub fn unblock(&self, user: UserId) {
        self.lock().blocked.remove(&ChatId::from(user));
    }

    /// Every operation that succeeded, in the order it was performed.
    pub fn log(&self) -> Vec<Chattable> {
        self.lock().log.clone()
    }

    /// Texts of every successful operation targeting `chat`, in order.
    pub fn texts_in(&self, chat: impl Into<ChatId>) -> Vec<String> {
        let chat = chat.into();
        self.lock()
            .log
            .iter()
            .filter(|c| c.chat_id() == chat)
            .map(|c| c.text().to_string())
            .collect()
    }

    /// The current state of one message.
    pub fn message(&self, chat: ChatId, id: MessageId) -> Option<StoredMessage> {
        self.lock().messages.get(&(chat, id)).cloned()
    }

    /// The most recently *sent* (not edited) message in `chat` whose text
    /// starts with `prefix`.
    pub fn find_sent(&self, chat: ChatId, prefix: &str) -> Option<StoredMessage> {
        self.lock()
            .messages
            .values()
            .filter(|m| m.chat_id == chat && m.original.starts_with(prefix))
            .max_by_key(|m| m.message_id.0)
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock only happens in a failing test;
        // the data is still usable for reporting.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn perform(&self, chattable: &Chattable) -> Result<SentMessage, PlatformError> {
        let mut inner = self.lock();
        let stored = match chattable {
            Chattable::Send(msg) => {
                if inner.blocked.contains(&msg.chat_id) {
                    return Err(PlatformError::Forbidden(
                        "bot can't initiate conversation with a user".into(),
                    ));
                }
                let next = inner.next_id.entry(msg.chat_id).or_insert(0);
                *next += 1;
                let stored = StoredMessage {
                    chat_id: msg.chat_id,
                    message_id: MessageId(*next),
                    text: msg.text.clone(),
                    keyboard: msg.keyboard.clone(),
                    original: msg.text.clone(),
                };
                inner
                    .messages
                    .insert((stored.chat_id, stored.message_id), stored.clone());
                stored
            }
            Chattable::Edit(edit) => {
                let Some(existing) = inner.messages.get_mut(&(edit.chat_id, edit.message_id)) else {
                    return Err(PlatformError::NotFound(format!(
                        "message {} in {}",
                        edit.message_id, edit.chat_id
                    )));
                };
                existing.text = edit.text.clone();
                existing.keyboard = edit.keyboard.clone();
                existing.clone()
            }
        };
        inner.log.push(chattable.clone());

        Ok(SentMessage {
            chat_id: stored.chat_id,
            message_id: stored.message_id,
            text: stored.text,
        })
    }
}

impl Platform for MemoryPlatform {
    async fn send(&self, chattable: &Chattable) -> Result<SentMessage, PlatformError> {
        self.perform(chattable)
    }
}

#[cfg(test)]
mod tests {
    use jasoos_protocol::{EditMessage, SendMessage};

    use super::*;

    #[test]
    fn test_ids_are_assigned_per_chat() {
        let platform = MemoryPlatform::new();
        let a1 = platform.perform(&SendMessage::new(ChatId(1), "a").into()).unwrap();
        let a2 = platform.perform(&SendMessage::new(ChatId(1), "b").into()).unwrap();
        let b1 = platform.perform(&SendMessage::new(ChatId(2), "c").into()).unwrap();
        assert_eq!(a1.message_id, MessageId(1));
        assert_eq!(a2.message_id, MessageId(2));
        assert_eq!(b1.message_id, MessageId(1));
    }

    #[test]
    fn test_blocked_user_cannot_receive() {
        let platform = MemoryPlatform::new();
        platform.block(UserId(5));
        let err = platform
            .perform(&SendMessage::new(UserId(5), "psst").into())
            .unwrap_err();
        assert!(matches!(err, PlatformError::Forbidden(_)));
        assert!(platform.log().is_empty());

        platform.unblock(UserId(5));
        assert!(platform.perform(&SendMessage::new(UserId(5), "psst").into()).is_ok());
    }

    #[test]
    fn test_edit_replaces_text_and_keyboard() {
        let platform = MemoryPlatform::new();
        let sent = platform
            .perform(
                &SendMessage::new(ChatId(1), "v1")
                    .with_keyboard(InlineKeyboard::default())
                    .into(),
            )
            .unwrap();
        platform
            .perform(&EditMessage::new(ChatId(1), sent.message_id, "v2").into())
            .unwrap();
        let stored = platform.message(ChatId(1), sent.message_id).unwrap();
        assert_eq!(stored.text, "v2");
        assert!(stored.keyboard.is_none());
    }

    #[test]
    fn test_edit_unknown_message_fails() {
        let platform = MemoryPlatform::new();
        let err = platform
            .perform(&EditMessage::new(ChatId(1), MessageId(7), "x").into())
            .unwrap_err();
        assert!(matches!(err, PlatformError::NotFound(_)));
    }
}
