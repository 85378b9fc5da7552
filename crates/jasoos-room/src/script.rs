//! Everything a room says, and the keyboards it attaches.
//!
//! Kept apart from the actor so the wording can be read (and tested) in one
//! place.

use std::time::Duration;

use jasoos_countdown::whole_minutes;
use jasoos_protocol::{CallbackAction, InlineButton, InlineKeyboard, MessageId};

use crate::Member;

pub(crate) fn welcome(chat_title: &str) -> String {
    format!("Successfully joined a game in {chat_title}. 😀")
}

pub(crate) fn not_started(name: &str) -> String {
    format!("{name} did you start the bot? 🤔")
}

pub(crate) fn created(creator: &str) -> String {
    format!("A game created by {creator}.")
}

pub(crate) fn joined(name: &str) -> String {
    format!("- {name} has joined.")
}

pub(crate) fn join_left(remaining: Duration) -> String {
    format!("⏳ {} sec left to join", remaining.as_secs())
}

pub(crate) const JOIN_CLOSED: &str = "Joining is closed.";

pub(crate) const LETS_PLAY: &str = "Let's play";

pub(crate) fn discuss_left(remaining: Duration) -> String {
    format!("{} min left to discuss", whole_minutes(remaining))
}

pub(crate) const DISCUSSION_OVER: &str = "Discussion is over.";

pub(crate) const LETS_VOTE: &str = "Let's vote";

pub(crate) fn voted(voter: &str, target: &str) -> String {
    format!("- {voter} voted for {target}.")
}

pub(crate) fn vote_left(remaining: Duration) -> String {
    format!("⏳ {} sec left to vote", remaining.as_secs())
}

pub(crate) const VOTING_CLOSED: &str = "Voting closed.";

/// The final announcement. `chosen` is the most voted name and its count.
pub fn result(spy: &str, chosen: Option<(&str, u32)>) -> String {
    match chosen {
        Some((name, count)) => format!(
            "{spy} is the Spy and you selected {name} as Spy with {count} votes."
        ),
        None => format!("{spy} is the Spy and nobody was voted as Spy."),
    }
}

// ---------------------------------------------------------------------------
// Keyboards
// ---------------------------------------------------------------------------

pub(crate) fn join_keyboard() -> InlineKeyboard {
    InlineKeyboard::column([InlineButton::action("Join", &CallbackAction::Join)])
}

/// One button per member, in member order.
pub(crate) fn vote_keyboard(members: &[Member]) -> InlineKeyboard {
    InlineKeyboard::column(members.iter().map(|m| {
        InlineButton::action(m.name.clone(), &CallbackAction::Vote(m.name.clone()))
    }))
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// A message the room keeps editing: a fixed header, a growing list of
/// lines (joins, votes) and a status footer (time left).
#[derive(Debug, Clone, Default)]
pub(crate) struct Board {
    pub(crate) message_id: Option<MessageId>,
    header: String,
    lines: Vec<String>,
    footer: String,
}

impl Board {
    pub(crate) fn new(header: impl Into<String>, footer: impl Into<String>) -> Self {
        Self {
            message_id: None,
            header: header.into(),
            lines: Vec::new(),
            footer: footer.into(),
        }
    }

    pub(crate) fn push_line(&mut self, line: String) {
        self.lines.push(line);
    }

    pub(crate) fn set_footer(&mut self, footer: impl Into<String>) {
        self.footer = footer.into();
    }

    pub(crate) fn render(&self) -> String {
        let mut text = self.header.clone();
        for line in &self.lines {
            text.push('\n');
            text.push_str(line);
        }
        if !self.footer.is_empty() {
            text.push_str("\n\n");
            text.push_str(&self.footer);
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use jasoos_protocol::UserId;

    use super::*;

    #[test]
    fn test_result_names_spy_and_choice() {
        assert_eq!(
            result("amy", Some(("B", 5))),
            "amy is the Spy and you selected B as Spy with 5 votes."
        );
        assert_eq!(result("amy", None), "amy is the Spy and nobody was voted as Spy.");
    }

    #[test]
    fn test_discussion_text_in_whole_minutes() {
        assert_eq!(discuss_left(Duration::from_secs(180)), "3 min left to discuss");
        assert_eq!(discuss_left(Duration::from_secs(60)), "1 min left to discuss");
    }

    #[test]
    fn test_board_render() {
        let mut board = Board::new(created("ali"), join_left(Duration::from_secs(60)));
        assert_eq!(board.render(), "A game created by ali.\n\n⏳ 60 sec left to join");

        board.push_line(joined("sara"));
        board.set_footer(join_left(Duration::from_secs(40)));
        assert_eq!(
            board.render(),
            "A game created by ali.\n- sara has joined.\n\n⏳ 40 sec left to join"
        );

        board.set_footer("");
        assert_eq!(board.render(), "A game created by ali.\n- sara has joined.");
    }

    #[test]
    fn test_vote_keyboard_follows_member_order() {
        let members = [Member::new("ali", UserId(1)), Member::new("sara", UserId(2))];
        let kb = vote_keyboard(&members);
        let buttons: Vec<(&str, &str)> = kb
            .buttons()
            .map(|b| (b.text.as_str(), b.callback_data.as_str()))
            .collect();
        assert_eq!(buttons, [("ali", "vote ali"), ("sara", "vote sara")]);
    }

    #[test]
    fn test_join_keyboard_has_single_join_button() {
        let kb = join_keyboard();
        let payloads: Vec<&str> = kb.buttons().map(|b| b.callback_data.as_str()).collect();
        assert_eq!(payloads, ["/join"]);
    }
}
