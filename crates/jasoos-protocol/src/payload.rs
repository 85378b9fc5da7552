//! Command strings and inline-button payloads.
//!
//! Button payloads are opaque strings on the platform side, so the encoding
//! here is the only place that has to agree with itself: whatever
//! [`CallbackAction`]'s `Display` writes, [`CallbackAction::parse`] reads back.

use std::fmt;
use std::str::FromStr;

use crate::ProtocolError;

/// Payload of the Join button.
const JOIN: &str = "/join";

/// Prefix of a vote button payload; the member's name follows after a space.
const VOTE: &str = "vote";

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// A slash command typed into a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `/newgame`: open a lobby, or retry a blocked creator.
    NewGame,
}

impl Command {
    /// Parses the first word of a message.
    ///
    /// Accepts the `/cmd@botname` form groups use when several bots are
    /// present; anything after the first whitespace is ignored.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let word = text.split_whitespace().next().unwrap_or_default();
        let name = word.split('@').next().unwrap_or_default();
        match name {
            "/newgame" => Ok(Self::NewGame),
            _ => Err(ProtocolError::UnknownCommand(word.to_string())),
        }
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Callback payloads
// ---------------------------------------------------------------------------

/// What an inline button asks the room to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Join the lobby.
    Join,
    /// Vote for the member with this display name.
    Vote(String),
}

impl CallbackAction {
    /// Parses a button payload.
    ///
    /// The vote target is everything after the first space, so display
    /// names containing spaces survive the round trip.
    pub fn parse(data: &str) -> Result<Self, ProtocolError> {
        if data == JOIN {
            return Ok(Self::Join);
        }
        match data.split_once(' ') {
            Some((VOTE, target)) if !target.is_empty() => {
                Ok(Self::Vote(target.to_string()))
            }
            _ => Err(ProtocolError::MalformedCallback(data.to_string())),
        }
    }
}

impl FromStr for CallbackAction {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Join => f.write_str(JOIN),
            Self::Vote(target) => write!(f, "{VOTE} {target}"),
        }
    }
}
