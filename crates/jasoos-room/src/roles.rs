//! Secret word and spy assignment.

use rand::Rng;

use crate::Member;

/// What the spy receives instead of the word.
pub const SPY: &str = "Spy";

/// The round's hidden information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Index into the member list.
    pub spy: usize,
    pub word: String,
}

impl Assignment {
    /// The text member `index` receives privately.
    pub fn secret_for(&self, index: usize) -> &str {
        if index == self.spy { SPY } else { self.word.as_str() }
    }
}

/// Picks the spy and the word, both uniformly at random.
///
/// Returns `None` if there are no members or no words.
pub fn assign<R: Rng>(
    members: &[Member],
    words: &[String],
    rng: &mut R,
) -> Option<Assignment> {
    if members.is_empty() || words.is_empty() {
        return None;
    }
    let spy = rng.random_range(0..members.len());
    let word = words[rng.random_range(0..words.len())].clone();
    Some(Assignment { spy, word })
}
