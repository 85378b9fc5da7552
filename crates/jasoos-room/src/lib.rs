//! Game rooms for Jasoos.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns one
//! chat's game: its members, the secret word, the ballot and the phase
//! countdown. All outbound messages go through the shared dispatcher.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: one room per chat, timeout supervision, reaping
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomState`]: lifecycle state machine
//! - [`RoomConfig`]: phase lengths, announcement spacing, vote policy
//! - [`Ballot`]: vote tally and winner selection

mod ballot;
mod config;
mod error;
mod member;
mod registry;
mod roles;
mod room;
mod script;

pub use ballot::Ballot;
pub use config::{PhaseTiming, RoomConfig, RoomState, VotePolicy};
pub use error::RoomError;
pub use member::Member;
pub use registry::{CloseReason, NewGame, RoomClosed, RoomRegistry};
pub use roles::{Assignment, SPY, assign};
pub use room::{RoomHandle, RoomId, RoomInfo, RoomOutcome};
pub use script::result as result_text;
