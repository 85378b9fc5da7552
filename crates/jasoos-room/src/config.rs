//! Room configuration and state machine.

use std::fmt;
use std::time::Duration;

use jasoos_countdown::CountdownConfig;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Length of one timed phase and how often its countdown is announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTiming {
    pub duration_secs: u64,
    pub announce_every_secs: u64,
}

impl PhaseTiming {
    pub const fn new(duration_secs: u64, announce_every_secs: u64) -> Self {
        Self {
            duration_secs,
            announce_every_secs,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    pub fn countdown(&self) -> CountdownConfig {
        CountdownConfig::new(self.duration(), Duration::from_secs(self.announce_every_secs))
    }
}

/// How repeated votes from the same voter are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotePolicy {
    /// Every button press counts, even several from one voter.
    #[default]
    Tally,
    /// Each voter holds one vote; pressing again moves it.
    LatestWins,
}

/// Configuration shared by every room in the process.
///
/// Missing fields in a config file fall back to [`RoomConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Lobby: how long members can join.
    pub join: PhaseTiming,
    /// Discussion before the ballot opens.
    pub discuss: PhaseTiming,
    /// How long the ballot stays open.
    pub vote: PhaseTiming,
    /// Hard ceiling on a room's life, whatever its phase.
    pub room_timeout_secs: u64,
    pub vote_policy: VotePolicy,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            join: PhaseTiming::new(60, 10),
            discuss: PhaseTiming::new(180, 60),
            vote: PhaseTiming::new(60, 20),
            room_timeout_secs: 600,
            vote_policy: VotePolicy::default(),
        }
    }
}

impl RoomConfig {
    pub fn room_timeout(&self) -> Duration {
        Duration::from_secs(self.room_timeout_secs)
    }

    /// Join, discussion and voting back to back.
    pub fn play_time(&self) -> Duration {
        self.join.duration() + self.discuss.duration() + self.vote.duration()
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
///            ┌──────────────┐
///            ▼              │ /newgame, probe ok
///  Join ──► CreatorBlocked ─┘
///   │
///   ▼
///  Discuss ──► Vote ──► End
/// ```
///
/// Every state can also jump to `End` when the room is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomState {
    /// Lobby open; members can join.
    Join,
    /// The creator can't receive direct messages; waiting for a retry.
    CreatorBlocked,
    /// Words handed out; the group is talking.
    Discuss,
    /// Ballot open.
    Vote,
    /// Over. The registry drops the room.
    End,
}

impl RoomState {
    /// Returns `true` if the room accepts join callbacks.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Join)
    }

    /// Returns `true` if the room accepts vote callbacks.
    pub fn accepts_votes(&self) -> bool {
        matches!(self, Self::Vote)
    }

    /// Returns `true` once the room can be replaced by a new game.
    pub fn is_over(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Returns `true` if moving to `target` is a valid transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        use RoomState::*;
        matches!(
            (self, target),
            (Join, CreatorBlocked)
                | (CreatorBlocked, Join)
                | (Join, Discuss)
                | (Discuss, Vote)
                | (Join | CreatorBlocked | Discuss | Vote, End)
        )
    }
}

impl fmt::Display for RoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Join => write!(f, "Join"),
            Self::CreatorBlocked => write!(f, "CreatorBlocked"),
            Self::Discuss => write!(f, "Discuss"),
            Self::Vote => write!(f, "Vote"),
            Self::End => write!(f, "End"),
        }
    }
}
