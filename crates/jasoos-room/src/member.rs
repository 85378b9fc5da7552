//! Room members.

use jasoos_protocol::{User, UserId};
use serde::{Deserialize, Serialize};

/// A participant in a room.
///
/// `id` is where direct messages go; `name` is what the group sees and what
/// vote buttons carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub id: UserId,
}

impl Member {
    pub fn new(name: impl Into<String>, id: UserId) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }

    /// Whether `other` is the same participant: same user id, or same
    /// display name. Vote buttons are keyed by name, so two members sharing
    /// a name could not be told apart on the ballot.
    pub fn same_as(&self, other: &Member) -> bool {
        self.id == other.id || self.name == other.name
    }
}

impl From<&User> for Member {
    fn from(user: &User) -> Self {
        Self {
            name: user.display_name(),
            id: user.id,
        }
    }
}

/// Returns `true` if `candidate` is already among `members`.
pub(crate) fn is_present(members: &[Member], candidate: &Member) -> bool {
    members.iter().any(|m| m.same_as(candidate))
}
