//! Console party: play Jasoos from a terminal.
//!
//! Every line on stdin is one inbound update:
//!
//! ```text
//! <chat> <user> <name> /newgame
//! <chat> <user> <name> press <message-id> <payload>
//! ```
//!
//! For example:
//!
//! ```text
//! -100 1 ali /newgame
//! -100 2 sara press 1 /join
//! -100 1 ali press 4 vote sara
//! ```
//!
//! Every send and edit the bot performs is printed. Users passed with
//! `--blocked` behave as if they never opened a private chat with the bot.

use std::path::PathBuf;

use clap::Parser;
use jasoos::prelude::*;
use jasoos_dispatch::StoredMessage;
use jasoos_room::PhaseTiming;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "console-party")]
#[command(about = "Play Jasoos from a terminal")]
struct Args {
    /// JSON config file.
    #[arg(long, default_value = jasoos::config::DEFAULT_PATH)]
    config: PathBuf,

    /// User id whose private messages fail. Repeatable.
    #[arg(long = "blocked", value_name = "USER_ID")]
    blocked: Vec<i64>,

    /// Shrink every timer so a game takes under a minute.
    #[arg(long)]
    fast: bool,
}

#[derive(Debug, thiserror::Error)]
enum InputError {
    #[error("expected `<chat> <user> <name> /newgame` or `<chat> <user> <name> press <id> <payload>`")]
    Shape,

    #[error("not a number: {0:?}")]
    Number(String),
}

/// The in-memory platform, echoing everything to stdout.
#[derive(Clone)]
struct ConsolePlatform {
    inner: MemoryPlatform,
}

impl Platform for ConsolePlatform {
    async fn send(&self, chattable: &Chattable) -> Result<SentMessage, PlatformError> {
        let result = self.inner.send(chattable).await;
        match &result {
            Ok(sent) => {
                let verb = match chattable {
                    Chattable::Send(_) => "send",
                    Chattable::Edit(_) => "edit",
                };
                println!("[{verb} {} {}]", sent.chat_id, sent.message_id);
                if let Some(stored) = self.inner.message(sent.chat_id, sent.message_id) {
                    print_message(&stored);
                }
            }
            Err(e) => println!("[failed {}] {e}", chattable.chat_id()),
        }
        result
    }
}

fn print_message(msg: &StoredMessage) {
    for line in msg.text.lines() {
        println!("  | {line}");
    }
    if let Some(keyboard) = &msg.keyboard {
        let buttons: Vec<String> = keyboard
            .buttons()
            .map(|b| format!("[{} => {}]", b.text, b.callback_data))
            .collect();
        println!("  | {}", buttons.join(" "));
    }
}

fn fast_room(room: RoomConfig) -> RoomConfig {
    RoomConfig {
        join: PhaseTiming::new(15, 5),
        discuss: PhaseTiming::new(20, 10),
        vote: PhaseTiming::new(15, 5),
        room_timeout_secs: 120,
        ..room
    }
}

fn number<T: std::str::FromStr>(field: &str) -> Result<T, InputError> {
    field
        .parse()
        .map_err(|_| InputError::Number(field.to_string()))
}

/// Turns one input line into an update.
///
/// `message_text` looks up the current text of a pressed message.
fn parse_line(
    line: &str,
    message_text: impl Fn(ChatId, MessageId) -> String,
) -> Result<Update, InputError> {
    let mut fields = line.split_whitespace();
    let (Some(chat), Some(user), Some(name), Some(verb)) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(InputError::Shape);
    };

    let chat_id = ChatId(number(chat)?);
    let chat = Chat::group(chat_id, format!("chat {chat_id}"));
    let from = User::new(UserId(number(user)?), name);

    if verb != "press" {
        return Ok(Update::Command {
            chat,
            from,
            text: std::iter::once(verb).chain(fields).collect::<Vec<_>>().join(" "),
        });
    }

    let message_id = MessageId(number(fields.next().ok_or(InputError::Shape)?)?);
    let data = fields.collect::<Vec<_>>().join(" ");
    if data.is_empty() {
        return Err(InputError::Shape);
    }
    Ok(Update::Callback {
        chat,
        from,
        message: MessageRef {
            id: message_id,
            text: message_text(chat_id, message_id),
        },
        data,
    })
}

#[tokio::main]
async fn main() -> Result<(), JasoosError> {
    jasoos::telemetry::init();
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if args.fast {
        config.room = fast_room(config.room);
    }

    let memory = MemoryPlatform::new();
    for user in &args.blocked {
        memory.block(UserId(*user));
    }
    let platform = ConsolePlatform {
        inner: memory.clone(),
    };

    let engine = Engine::with_platform(&config, platform);
    let (updates_tx, updates_rx) = mpsc::channel(64);
    let engine_task = tokio::spawn(engine.run(updates_rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "cannot read stdin");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let update = parse_line(line, |chat, id| {
            memory
                .message(chat, id)
                .map(|m| m.text)
                .unwrap_or_default()
        });
        match update {
            Ok(update) => {
                if updates_tx.send(update).await.is_err() {
                    tracing::error!("engine stopped");
                    break;
                }
            }
            Err(e) => eprintln!("{e}"),
        }
    }

    // Rooms keep running on their timers after input ends.
    eprintln!("input closed; press Ctrl-C to quit");
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for Ctrl-C");
    }
    drop(updates_tx);

    match engine_task.await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "engine task failed");
            Ok(())
        }
    }
}
