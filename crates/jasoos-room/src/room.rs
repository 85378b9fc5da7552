//! Room actor: an isolated Tokio task that owns one game.
//!
//! Each room runs in its own task and is reached only through its command
//! channel, so joins, votes and timer transitions for a room are applied
//! one at a time with no locks. The phase countdown sits in the same
//! `select!` loop as the commands, next to a cancellation signal the
//! supervisor fires on timeout.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use jasoos_countdown::{Countdown, CountdownEvent};
use jasoos_dispatch::DispatchSender;
use jasoos_protocol::{ChatId, Chattable, EditMessage, MessageId, MessageRef, SendMessage, UserId};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};

use crate::ballot::Ballot;
use crate::member::is_present;
use crate::roles::{self, Assignment};
use crate::script::{self, Board};
use crate::{Member, RoomConfig, RoomError, RoomState};

/// Process-unique identifier of one room instance.
///
/// A chat gets a fresh `RoomId` for every game, so a stale notification
/// about an old game can't be mistaken for the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// `/newgame` again while the creator is blocked.
    RetryCreator { creator: Member },

    /// Join button pressed on `message`.
    Join { member: Member, message: MessageRef },

    /// Vote button for `target` pressed on `message`.
    Vote {
        voter: Member,
        target: String,
        message: MessageRef,
    },

    /// Request a snapshot of the room.
    GetInfo { reply: oneshot::Sender<RoomInfo> },
}

/// A snapshot of a room.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub chat_id: ChatId,
    pub state: RoomState,
    /// In join order; the creator first.
    pub members: Vec<Member>,
    /// Display name of the spy, once words are handed out.
    pub spy: Option<String>,
    /// The secret word, once handed out.
    pub word: Option<String>,
    /// Vote counts in first-vote order.
    pub votes: Vec<(String, u32)>,
}

/// Why a room actor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomOutcome {
    /// The result was announced.
    Finished,
    /// The supervisor cancelled it.
    Cancelled,
    /// Every handle was dropped.
    Abandoned,
}

// ---------------------------------------------------------------------------
// RoomHandle
// ---------------------------------------------------------------------------

/// Handle to a running room actor. Cheap to clone.
///
/// The room's state is published through a `watch` channel, so
/// [`state`](Self::state) never waits on the actor, even while it is
/// blocked on a delivery probe, and still reads `End` after it stopped.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    chat_id: ChatId,
    sender: mpsc::Sender<RoomCommand>,
    state: watch::Receiver<RoomState>,
}

impl RoomHandle {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    /// The room's current lifecycle state.
    pub fn state(&self) -> RoomState {
        *self.state.borrow()
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Waits until the room reaches `target`.
    pub async fn wait_for_state(&self, target: RoomState) -> Result<(), RoomError> {
        let mut state = self.state.clone();
        state
            .wait_for(|s| *s == target)
            .await
            .map(|_| ())
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    pub(crate) fn retry_creator(&self, creator: Member) -> Result<(), RoomError> {
        self.enqueue(RoomCommand::RetryCreator { creator })
    }

    pub(crate) fn join(&self, member: Member, message: MessageRef) -> Result<(), RoomError> {
        self.enqueue(RoomCommand::Join { member, message })
    }

    pub(crate) fn vote(
        &self,
        voter: Member,
        target: String,
        message: MessageRef,
    ) -> Result<(), RoomError> {
        self.enqueue(RoomCommand::Vote {
            voter,
            target,
            message,
        })
    }

    /// Requests a snapshot. Waits behind any command the room is handling.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Queues `cmd` without waiting. A room whose queue is full is busy
    /// (usually stuck on a slow send) and the command is refused.
    fn enqueue(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender.try_send(cmd).map_err(|e| match e {
            TrySendError::Full(_) => {
                tracing::debug!(room_id = %self.room_id, "room queue full, command dropped");
                RoomError::Busy(self.room_id)
            }
            TrySendError::Closed(_) => RoomError::Unavailable(self.room_id),
        })
    }
}

// ---------------------------------------------------------------------------
// RoomActor
// ---------------------------------------------------------------------------

/// The internal room state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    chat_id: ChatId,
    chat_title: String,
    state: RoomState,
    /// Shared with the supervisor, which may force `End` on timeout.
    state_tx: Arc<watch::Sender<RoomState>>,
    config: RoomConfig,
    members: Vec<Member>,
    words: Arc<[String]>,
    assignment: Option<Assignment>,
    spy: Option<String>,
    ballot: Ballot,
    /// Users already told to start the bot.
    warned: HashSet<UserId>,
    lobby: Board,
    discussion: Option<MessageId>,
    ballot_board: Board,
    countdown: Option<Countdown>,
    dispatch: DispatchSender,
    receiver: mpsc::Receiver<RoomCommand>,
    cancel: oneshot::Receiver<()>,
    done: Option<oneshot::Sender<RoomOutcome>>,
}

impl RoomActor {
    /// Admits the creator, then processes commands and countdown events
    /// until the game ends or is cancelled.
    async fn run(mut self) {
        tracing::info!(
            room_id = %self.room_id,
            chat_id = %self.chat_id,
            creator = %self.members[0].name,
            "room actor started"
        );

        self.admit_creator().await;

        let outcome = loop {
            if self.state.is_over() {
                break match self.cancel.try_recv() {
                    Ok(()) => RoomOutcome::Cancelled,
                    Err(_) => RoomOutcome::Finished,
                };
            }

            tokio::select! {
                biased;

                _ = &mut self.cancel => {
                    tracing::info!(
                        room_id = %self.room_id,
                        state = %self.state,
                        "room cancelled"
                    );
                    self.transition(RoomState::End);
                    break RoomOutcome::Cancelled;
                }
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle(cmd).await,
                    None => {
                        self.transition(RoomState::End);
                        break RoomOutcome::Abandoned;
                    }
                },
                event = next_event(&mut self.countdown) => {
                    self.on_countdown(event).await;
                }
            }
        };

        self.countdown = None;
        if let Some(done) = self.done.take() {
            let _ = done.send(outcome);
        }
        tracing::info!(room_id = %self.room_id, ?outcome, "room actor stopped");
    }

    async fn handle(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::RetryCreator { creator } => self.retry_creator(creator).await,
            RoomCommand::Join { member, message } => self.handle_join(member, message).await,
            RoomCommand::Vote {
                voter,
                target,
                message,
            } => self.handle_vote(voter, target, message).await,
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
        }
    }

    // -- Admission ----------------------------------------------------------

    async fn admit_creator(&mut self) {
        let creator = self.members[0].clone();
        if self.probe(&creator).await {
            self.open_lobby().await;
        } else {
            tracing::info!(
                room_id = %self.room_id,
                user_id = %creator.id,
                "creator can't receive direct messages"
            );
            self.transition(RoomState::CreatorBlocked);
        }
    }

    async fn retry_creator(&mut self, creator: Member) {
        if self.state != RoomState::CreatorBlocked {
            tracing::debug!(room_id = %self.room_id, state = %self.state, "retry ignored");
            return;
        }
        self.members[0] = creator;
        self.admit_creator().await;
    }

    async fn handle_join(&mut self, member: Member, message: MessageRef) {
        if !self.state.is_joinable() {
            tracing::debug!(
                room_id = %self.room_id,
                state = %self.state,
                user_id = %member.id,
                "join outside lobby ignored"
            );
            return;
        }
        if is_present(&self.members, &member) {
            tracing::debug!(room_id = %self.room_id, user_id = %member.id, "already joined");
            return;
        }
        if !self.probe(&member).await {
            return;
        }

        self.lobby.push_line(script::joined(&member.name));
        tracing::info!(
            room_id = %self.room_id,
            user_id = %member.id,
            members = self.members.len() + 1,
            "member joined"
        );
        self.members.push(member);

        let edit = EditMessage::new(self.chat_id, message.id, self.lobby.render())
            .with_keyboard(script::join_keyboard());
        self.post(edit).await;
    }

    /// Sends the private welcome and waits for the outcome.
    ///
    /// On failure the group is warned, once per user for the room's life.
    async fn probe(&mut self, member: &Member) -> bool {
        let welcome = SendMessage::new(member.id, script::welcome(&self.chat_title));
        match self.dispatch.deliver(welcome).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(
                    room_id = %self.room_id,
                    user_id = %member.id,
                    error = %e,
                    "deliverability probe failed"
                );
                if self.warned.insert(member.id) {
                    self.post(SendMessage::new(self.chat_id, script::not_started(&member.name)))
                        .await;
                }
                false
            }
        }
    }

    // -- Phases -------------------------------------------------------------

    async fn open_lobby(&mut self) {
        let join = self.config.join;
        self.lobby = Board::new(
            script::created(&self.members[0].name),
            script::join_left(join.duration()),
        );
        let msg = SendMessage::new(self.chat_id, self.lobby.render())
            .with_keyboard(script::join_keyboard());
        self.lobby.message_id = self.deliver(msg).await;

        self.transition(RoomState::Join);
        self.countdown = Some(Countdown::start(join.countdown()));
    }

    async fn on_countdown(&mut self, event: CountdownEvent) {
        match (self.state, event) {
            (RoomState::Join, CountdownEvent::Announce(a)) => {
                self.lobby.set_footer(script::join_left(a.remaining));
                if let Some(edit) = edit_of(self.chat_id, &self.lobby) {
                    self.post(edit.with_keyboard(script::join_keyboard())).await;
                }
            }
            (RoomState::Join, CountdownEvent::Expired) => self.start_discussion().await,
            (RoomState::Discuss, CountdownEvent::Announce(a)) => {
                if let Some(id) = self.discussion {
                    let text = script::discuss_left(a.remaining);
                    self.post(EditMessage::new(self.chat_id, id, text)).await;
                }
            }
            (RoomState::Discuss, CountdownEvent::Expired) => self.open_ballot().await,
            (RoomState::Vote, CountdownEvent::Announce(a)) => {
                self.ballot_board.set_footer(script::vote_left(a.remaining));
                if let Some(edit) = edit_of(self.chat_id, &self.ballot_board) {
                    self.post(edit.with_keyboard(script::vote_keyboard(&self.members)))
                        .await;
                }
            }
            (RoomState::Vote, CountdownEvent::Expired) => self.resolve().await,
            (state, event) => {
                tracing::debug!(room_id = %self.room_id, %state, ?event, "countdown event ignored");
            }
        }
    }

    async fn start_discussion(&mut self) {
        self.countdown = None;

        // Drop the Join button.
        self.lobby.set_footer(script::JOIN_CLOSED);
        if let Some(edit) = edit_of(self.chat_id, &self.lobby) {
            self.post(edit).await;
        }
        self.post(SendMessage::new(self.chat_id, script::LETS_PLAY)).await;

        let assignment = {
            let mut rng = rand::rng();
            roles::assign(&self.members, &self.words, &mut rng)
        };
        let Some(assignment) = assignment else {
            tracing::error!(room_id = %self.room_id, "no words to hand out, ending room");
            self.transition(RoomState::End);
            return;
        };

        for (index, member) in self.members.iter().enumerate() {
            let secret = assignment.secret_for(index).to_string();
            self.post(SendMessage::new(member.id, secret)).await;
        }
        self.spy = Some(self.members[assignment.spy].name.clone());
        self.assignment = Some(assignment);
        self.transition(RoomState::Discuss);
        tracing::info!(
            room_id = %self.room_id,
            members = self.members.len(),
            "words handed out"
        );

        let discuss = self.config.discuss;
        let status = SendMessage::new(self.chat_id, script::discuss_left(discuss.duration()));
        self.discussion = self.deliver(status).await;
        self.countdown = Some(Countdown::start(discuss.countdown()));
    }

    async fn open_ballot(&mut self) {
        self.countdown = None;
        if let Some(id) = self.discussion {
            self.post(EditMessage::new(self.chat_id, id, script::DISCUSSION_OVER))
                .await;
        }

        let vote = self.config.vote;
        self.ballot_board = Board::new(script::LETS_VOTE, script::vote_left(vote.duration()));
        let msg = SendMessage::new(self.chat_id, self.ballot_board.render())
            .with_keyboard(script::vote_keyboard(&self.members));
        self.ballot_board.message_id = self.deliver(msg).await;

        self.transition(RoomState::Vote);
        self.countdown = Some(Countdown::start(vote.countdown()));
    }

    async fn handle_vote(&mut self, voter: Member, target: String, message: MessageRef) {
        if !self.state.accepts_votes() {
            tracing::debug!(
                room_id = %self.room_id,
                state = %self.state,
                user_id = %voter.id,
                "vote outside ballot ignored"
            );
            return;
        }

        self.ballot.cast(voter.id, &target);
        self.ballot_board.push_line(script::voted(&voter.name, &target));
        tracing::debug!(
            room_id = %self.room_id,
            user_id = %voter.id,
            %target,
            count = self.ballot.count(&target),
            "vote cast"
        );

        let edit = EditMessage::new(self.chat_id, message.id, self.ballot_board.render())
            .with_keyboard(script::vote_keyboard(&self.members));
        self.post(edit).await;
    }

    async fn resolve(&mut self) {
        self.countdown = None;

        self.ballot_board.set_footer(script::VOTING_CLOSED);
        if let Some(edit) = edit_of(self.chat_id, &self.ballot_board) {
            self.post(edit).await;
        }

        let spy = self.spy.clone().unwrap_or_default();
        let chosen = self.ballot.winner();
        let text = script::result(&spy, chosen);
        tracing::info!(
            room_id = %self.room_id,
            %spy,
            chosen = ?chosen,
            "game finished"
        );
        self.post(SendMessage::new(self.chat_id, text)).await;
        self.transition(RoomState::End);
    }

    // -- Helpers ------------------------------------------------------------

    fn transition(&mut self, next: RoomState) {
        if self.state == next {
            return;
        }
        if *self.state_tx.borrow() == RoomState::End {
            // Ended from outside while this actor was stuck on a send.
            tracing::debug!(room_id = %self.room_id, to = %next, "room already ended");
            self.state = RoomState::End;
            return;
        }
        if !self.state.can_transition_to(next) {
            tracing::warn!(
                room_id = %self.room_id,
                from = %self.state,
                to = %next,
                "unexpected room transition"
            );
        }
        tracing::debug!(room_id = %self.room_id, from = %self.state, to = %next, "transition");
        self.state = next;
        self.state_tx.send_replace(next);
    }

    /// Fire-and-forget send.
    async fn post(&self, chattable: impl Into<Chattable>) {
        if let Err(e) = self.dispatch.post(chattable).await {
            tracing::warn!(room_id = %self.room_id, error = %e, "cannot queue message");
        }
    }

    /// Send and wait for the stored message id.
    async fn deliver(&self, msg: SendMessage) -> Option<MessageId> {
        match self.dispatch.deliver(msg).await {
            Ok(sent) => Some(sent.message_id),
            Err(e) => {
                tracing::warn!(
                    room_id = %self.room_id,
                    error = %e,
                    "cannot post group message; it won't be updated"
                );
                None
            }
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            chat_id: self.chat_id,
            state: self.state,
            members: self.members.clone(),
            spy: self.spy.clone(),
            word: self.assignment.as_ref().map(|a| a.word.clone()),
            votes: self.ballot.entries().to_vec(),
        }
    }
}

/// An edit re-rendering `board`, if it was posted successfully.
fn edit_of(chat_id: ChatId, board: &Board) -> Option<EditMessage> {
    board
        .message_id
        .map(|id| EditMessage::new(chat_id, id, board.render()))
}

/// The next countdown event, or never when no countdown is running.
async fn next_event(countdown: &mut Option<Countdown>) -> CountdownEvent {
    match countdown {
        Some(countdown) => countdown.wait().await,
        None => std::future::pending().await,
    }
}

// ---------------------------------------------------------------------------
// Spawning
// ---------------------------------------------------------------------------

/// Everything a new room starts from.
pub(crate) struct RoomSetup {
    pub(crate) room_id: RoomId,
    pub(crate) chat_id: ChatId,
    pub(crate) chat_title: String,
    pub(crate) creator: Member,
    pub(crate) words: Arc<[String]>,
    pub(crate) config: RoomConfig,
    pub(crate) dispatch: DispatchSender,
}

/// What the registry keeps from a spawned room: the handle it routes
/// through, and the ends the supervisor holds.
pub(crate) struct SpawnedRoom {
    pub(crate) handle: RoomHandle,
    pub(crate) done: oneshot::Receiver<RoomOutcome>,
    pub(crate) cancel: oneshot::Sender<()>,
    pub(crate) state: Arc<watch::Sender<RoomState>>,
}

/// Spawns a room actor task.
///
/// `channel_size` bounds the command queue; once it is full, further
/// commands are refused with [`RoomError::Busy`].
pub(crate) fn spawn_room(setup: RoomSetup, channel_size: usize) -> SpawnedRoom {
    let (tx, rx) = mpsc::channel(channel_size);
    let (state_tx, state_rx) = watch::channel(RoomState::Join);
    let state_tx = Arc::new(state_tx);
    let (done_tx, done_rx) = oneshot::channel();
    let (cancel_tx, cancel_rx) = oneshot::channel();

    let policy = setup.config.vote_policy;
    let actor = RoomActor {
        room_id: setup.room_id,
        chat_id: setup.chat_id,
        chat_title: setup.chat_title,
        state: RoomState::Join,
        state_tx: Arc::clone(&state_tx),
        config: setup.config,
        members: vec![setup.creator],
        words: setup.words,
        assignment: None,
        spy: None,
        ballot: Ballot::new(policy),
        warned: HashSet::new(),
        lobby: Board::default(),
        discussion: None,
        ballot_board: Board::default(),
        countdown: None,
        dispatch: setup.dispatch,
        receiver: rx,
        cancel: cancel_rx,
        done: Some(done_tx),
    };

    tokio::spawn(actor.run());

    SpawnedRoom {
        handle: RoomHandle {
            room_id: setup.room_id,
            chat_id: setup.chat_id,
            sender: tx,
            state: state_rx,
        },
        done: done_rx,
        cancel: cancel_tx,
        state: state_tx,
    }
}
