//! Vote tally.
//!
//! Entries are kept in the order their first vote arrived. The winner is the
//! entry with the strictly greatest count, scanning in that order, so a tie
//! goes to whoever was voted for first.

use std::collections::HashMap;

use jasoos_protocol::UserId;

use crate::VotePolicy;

#[derive(Debug, Clone)]
pub struct Ballot {
    policy: VotePolicy,
    tally: Vec<(String, u32)>,
    /// Each voter's current choice, tracked only under `LatestWins`.
    latest: HashMap<UserId, String>,
}

impl Ballot {
    pub fn new(policy: VotePolicy) -> Self {
        Self {
            policy,
            tally: Vec::new(),
            latest: HashMap::new(),
        }
    }

    /// Builds a ballot from pre-counted entries, in the given order.
    pub fn from_tally<S: Into<String>>(entries: impl IntoIterator<Item = (S, u32)>) -> Self {
        Self {
            policy: VotePolicy::Tally,
            tally: entries.into_iter().map(|(n, c)| (n.into(), c)).collect(),
            latest: HashMap::new(),
        }
    }

    /// Records one vote from `voter` for `target`.
    ///
    /// `target` isn't checked against the member list.
    pub fn cast(&mut self, voter: UserId, target: &str) {
        if self.policy == VotePolicy::LatestWins {
            match self.latest.insert(voter, target.to_string()) {
                Some(previous) if previous == target => return,
                Some(previous) => self.adjust(&previous, -1),
                None => {}
            }
        }
        self.adjust(target, 1);
    }

    fn adjust(&mut self, target: &str, delta: i32) {
        match self.tally.iter_mut().find(|(name, _)| name == target) {
            Some((_, count)) => *count = count.saturating_add_signed(delta),
            None if delta > 0 => self.tally.push((target.to_string(), delta as u32)),
            None => {}
        }
    }

    /// Current count for `name` (0 if never voted for).
    pub fn count(&self, name: &str) -> u32 {
        self.tally
            .iter()
            .find(|(n, _)| n == name)
            .map_or(0, |(_, c)| *c)
    }

    /// The most voted name and its count, or `None` if nobody holds a vote.
    pub fn winner(&self) -> Option<(&str, u32)> {
        let mut best: Option<(&str, u32)> = None;
        for (name, count) in &self.tally {
            if *count > best.map_or(0, |(_, c)| c) {
                best = Some((name.as_str(), *count));
            }
        }
        best
    }

    /// Entries in first-vote order.
    pub fn entries(&self) -> &[(String, u32)] {
        &self.tally
    }

    pub fn policy(&self) -> VotePolicy {
        self.policy
    }
}
