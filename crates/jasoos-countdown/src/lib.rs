//! Phase countdowns for Jasoos rooms.
//!
//! A [`Countdown`] runs for a fixed duration and fires a coarse
//! *announcement* every `announce_every` along the way (so the room can
//! edit "40 sec left to join" without editing on every second), then a
//! final [`CountdownEvent::Expired`].
//!
//! Announcements sit on a fixed grid measured from the start:
//!
//! ```text
//! start        +every       +2·every      ...        deadline
//!   |------------|------------|-----------------------|
//!              Announce     Announce               Expired
//! ```
//!
//! If the owner is busy when a grid point passes (a room actor waiting on a
//! delivery report, say), the missed points are skipped and only the latest
//! one is announced. The deadline itself never moves.
//!
//! # Integration
//!
//! The countdown is meant to sit inside a room actor's `tokio::select!`
//! loop next to its command channel:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = commands.recv() => { /* joins, votes */ }
//!         event = countdown.wait() => { /* edit message or change phase */ }
//!     }
//! }
//! ```
//!
//! Dropping the `Countdown` cancels it; nothing runs in the background.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Timing of one countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownConfig {
    /// Total length. The `Expired` event fires this long after start.
    pub duration: Duration,
    /// Spacing of announcements. Zero, or anything not shorter than
    /// `duration`, means no announcements at all.
    pub announce_every: Duration,
}

impl CountdownConfig {
    pub fn new(duration: Duration, announce_every: Duration) -> Self {
        Self {
            duration,
            announce_every,
        }
    }

    /// Announcement spacing, or `None` when no announcement would fall
    /// strictly before the deadline.
    pub fn interval(&self) -> Option<Duration> {
        if self.announce_every.is_zero() || self.announce_every >= self.duration {
            None
        } else {
            Some(self.announce_every)
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A grid point reached before the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Announcement {
    /// 1-based index of the grid point being announced.
    pub tick: u64,
    /// Time left from this grid point to the deadline.
    ///
    /// Measured from the *scheduled* point, not from when the owner woke
    /// up, so texts show round numbers.
    pub remaining: Duration,
    /// Grid points passed over because the owner was late (0 normally).
    pub skipped: u64,
}

/// What [`Countdown::wait`] resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    Announce(Announcement),
    Expired,
}

// ---------------------------------------------------------------------------
// Countdown
// ---------------------------------------------------------------------------

/// One running countdown. Owned by the task that reacts to it.
#[derive(Debug)]
pub struct Countdown {
    config: CountdownConfig,
    started: Instant,
    deadline: Instant,
    /// Index of the next grid point to announce (1-based).
    next_tick: u64,
    expired: bool,
    skipped_total: u64,
}

impl Countdown {
    /// Starts a countdown now.
    pub fn start(config: CountdownConfig) -> Self {
        Self::start_at(config, Instant::now())
    }

    /// Starts a countdown whose grid is anchored at `started`.
    pub fn start_at(config: CountdownConfig, started: Instant) -> Self {
        debug!(
            duration_secs = config.duration.as_secs(),
            announce_every_secs = config.announce_every.as_secs(),
            "countdown started"
        );
        Self {
            config,
            started,
            deadline: started + config.duration,
            next_tick: 1,
            expired: false,
            skipped_total: 0,
        }
    }

    /// Waits for the next announcement or the deadline.
    ///
    /// After `Expired` has been returned once, this future pends forever;
    /// `tokio::select!` keeps serving its other branches.
    pub async fn wait(&mut self) -> CountdownEvent {
        if self.expired {
            return std::future::pending().await;
        }

        loop {
            let wake_at = self.grid_point(self.next_tick).unwrap_or(self.deadline);
            time::sleep_until(wake_at).await;

            let now = Instant::now();
            if now >= self.deadline {
                self.expired = true;
                trace!("countdown expired");
                return CountdownEvent::Expired;
            }
            let Some(every) = self.config.interval() else {
                continue;
            };

            // Latest grid point already passed; anything between
            // `next_tick` and it was missed.
            let elapsed = now.saturating_duration_since(self.started);
            let reached = (elapsed.as_nanos() / every.as_nanos()) as u64;
            let tick = reached.max(self.next_tick);
            let skipped = tick - self.next_tick;
            if skipped > 0 {
                self.skipped_total += skipped;
                warn!(tick, skipped, "countdown overrun, skipping announcements");
            }
            self.next_tick = tick + 1;

            let at = self.started + every * tick as u32;
            let remaining = self.deadline.saturating_duration_since(at);
            trace!(tick, remaining_secs = remaining.as_secs(), "countdown announce");

            return CountdownEvent::Announce(Announcement {
                tick,
                remaining,
                skipped,
            });
        }
    }

    /// The instant of grid point `tick`, if it falls strictly before the
    /// deadline.
    fn grid_point(&self, tick: u64) -> Option<Instant> {
        let every = self.config.interval()?;
        let at = self.started + every.checked_mul(u32::try_from(tick).ok()?)?;
        (at < self.deadline).then_some(at)
    }

    /// Time left until the deadline, from now.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// When the countdown expires.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Whether `Expired` has been returned.
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Total grid points skipped so far.
    pub fn skipped_total(&self) -> u64 {
        self.skipped_total
    }

    /// The configuration this countdown runs with.
    pub fn config(&self) -> CountdownConfig {
        self.config
    }
}

/// Rounds a duration up to whole minutes, for "N min left" texts.
pub fn whole_minutes(d: Duration) -> u64 {
    d.as_secs().div_ceil(60)
}
