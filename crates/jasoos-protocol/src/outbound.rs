//! Outbound operations handed to the platform.

use serde::{Deserialize, Serialize};

use crate::{CallbackAction, ChatId, MessageId};

// ---------------------------------------------------------------------------
// Keyboards
// ---------------------------------------------------------------------------

/// One inline button: a label and the payload sent back when pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    /// A button whose payload is an encoded [`CallbackAction`].
    pub fn action(text: impl Into<String>, action: &CallbackAction) -> Self {
        Self {
            text: text.into(),
            callback_data: action.to_string(),
        }
    }
}

/// A keyboard attached under a message, laid out as rows of buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    /// A keyboard with each button on its own row.
    pub fn column(buttons: impl IntoIterator<Item = InlineButton>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    /// All buttons in reading order.
    pub fn buttons(&self) -> impl Iterator<Item = &InlineButton> {
        self.rows.iter().flatten()
    }
}

// ---------------------------------------------------------------------------
// Chattable
// ---------------------------------------------------------------------------

/// Post a new text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessage {
    pub chat_id: ChatId,
    pub text: String,
    #[serde(default)]
    pub keyboard: Option<InlineKeyboard>,
}

impl SendMessage {
    pub fn new(chat_id: impl Into<ChatId>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Replace the text (and keyboard) of a message the bot sent earlier.
///
/// An edit without a keyboard removes any keyboard the message had.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub text: String,
    #[serde(default)]
    pub keyboard: Option<InlineKeyboard>,
}

impl EditMessage {
    pub fn new(chat_id: ChatId, message_id: MessageId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            message_id,
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Anything the platform can be asked to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Chattable {
    Send(SendMessage),
    Edit(EditMessage),
}

impl Chattable {
    /// The chat this operation targets.
    pub fn chat_id(&self) -> ChatId {
        match self {
            Self::Send(m) => m.chat_id,
            Self::Edit(m) => m.chat_id,
        }
    }

    /// The text this operation leaves on screen.
    pub fn text(&self) -> &str {
        match self {
            Self::Send(m) => &m.text,
            Self::Edit(m) => &m.text,
        }
    }

    /// The keyboard this operation leaves on screen, if any.
    pub fn keyboard(&self) -> Option<&InlineKeyboard> {
        match self {
            Self::Send(m) => m.keyboard.as_ref(),
            Self::Edit(m) => m.keyboard.as_ref(),
        }
    }
}

impl From<SendMessage> for Chattable {
    fn from(msg: SendMessage) -> Self {
        Self::Send(msg)
    }
}

impl From<EditMessage> for Chattable {
    fn from(msg: EditMessage) -> Self {
        Self::Edit(msg)
    }
}

/// What the platform returns after a successful send or edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_keyboard_one_button_per_row() {
        let kb = InlineKeyboard::column([
            InlineButton::action("a", &CallbackAction::Vote("a".into())),
            InlineButton::action("b", &CallbackAction::Vote("b".into())),
        ]);
        assert_eq!(kb.rows.len(), 2);
        let payloads: Vec<_> = kb.buttons().map(|b| b.callback_data.as_str()).collect();
        assert_eq!(payloads, ["vote a", "vote b"]);
    }

    #[test]
    fn test_chattable_accessors() {
        let send: Chattable = SendMessage::new(ChatId(3), "hi")
            .with_keyboard(InlineKeyboard::default())
            .into();
        assert_eq!(send.chat_id(), ChatId(3));
        assert_eq!(send.text(), "hi");
        assert!(send.keyboard().is_some());

        let edit: Chattable = EditMessage::new(ChatId(3), MessageId(9), "bye").into();
        assert_eq!(edit.text(), "bye");
        assert!(edit.keyboard().is_none());
    }
}
