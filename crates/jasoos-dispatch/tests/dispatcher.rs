//! Integration tests for the dispatch channel and its single consumer.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use jasoos_dispatch::{
    channel, DispatchError, MemoryPlatform, Platform, PlatformError, Request,
};
use jasoos_protocol::{ChatId, Chattable, EditMessage, MessageId, SendMessage, SentMessage, UserId};
use tokio::sync::oneshot;

// =========================================================================
// Mock platform: fails any text containing "boom", sleeps on "slow".
// =========================================================================

#[derive(Clone, Default)]
struct ScriptedPlatform {
    performed: Arc<Mutex<Vec<String>>>,
}

impl ScriptedPlatform {
    fn performed(&self) -> Vec<String> {
        self.performed.lock().unwrap().clone()
    }
}

impl Platform for ScriptedPlatform {
    async fn send(&self, chattable: &Chattable) -> Result<SentMessage, PlatformError> {
        let text = chattable.text().to_string();
        if text.contains("slow") {
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        if text.contains("boom") {
            return Err(PlatformError::Api {
                code: 400,
                description: "bad request".into(),
            });
        }
        let id = {
            let mut performed = self.performed.lock().unwrap();
            performed.push(text.clone());
            performed.len() as i32
        };
        Ok(SentMessage {
            chat_id: chattable.chat_id(),
            message_id: MessageId(id),
            text,
        })
    }
}

fn text(chat: i64, text: &str) -> SendMessage {
    SendMessage::new(ChatId(chat), text)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_deliver_reports_success() {
    let platform = ScriptedPlatform::default();
    let (tx, dispatcher) = channel(platform.clone(), 8);
    tokio::spawn(dispatcher.run());

    let sent = tx.deliver(text(1, "hello")).await.unwrap();
    assert_eq!(sent.chat_id, ChatId(1));
    assert_eq!(sent.text, "hello");
    assert_eq!(platform.performed(), ["hello"]);
}

#[tokio::test]
async fn test_deliver_reports_failure_and_loop_survives() {
    let platform = ScriptedPlatform::default();
    let (tx, dispatcher) = channel(platform.clone(), 8);
    tokio::spawn(dispatcher.run());

    let err = tx.deliver(text(1, "boom")).await.unwrap_err();
    assert!(matches!(err, DispatchError::Platform(PlatformError::Api { code: 400, .. })));

    // The loop keeps draining after a failure.
    tx.post(text(1, "after")).await.unwrap();
    let sent = tx.deliver(text(1, "last")).await.unwrap();
    assert_eq!(sent.text, "last");
    assert_eq!(platform.performed(), ["after", "last"]);
}

#[tokio::test]
async fn test_every_report_channel_gets_exactly_one_response() {
    let platform = ScriptedPlatform::default();
    let (tx, dispatcher) = channel(platform, 16);
    tokio::spawn(dispatcher.run());

    let mut receivers = Vec::new();
    for i in 0..6 {
        let (report_tx, report_rx) = oneshot::channel();
        let body = if i % 2 == 0 { "ok" } else { "boom" };
        tx.submit(Request {
            chattable: text(1, body).into(),
            report: Some(report_tx),
        })
        .await
        .unwrap();
        receivers.push(report_rx);
    }

    let mut ok = 0;
    let mut failed = 0;
    for rx in receivers {
        match rx.await.unwrap().into_result() {
            Ok(_) => ok += 1,
            Err(_) => failed += 1,
        }
    }
    assert_eq!((ok, failed), (3, 3));
}

#[tokio::test(start_paused = true)]
async fn test_sends_are_sequential_in_arrival_order() {
    let platform = ScriptedPlatform::default();
    let (tx, dispatcher) = channel(platform.clone(), 8);
    tokio::spawn(dispatcher.run());

    // A slow first send must not let later sends overtake it.
    tx.post(text(1, "slow first")).await.unwrap();
    tx.post(text(1, "second")).await.unwrap();
    tx.deliver(text(1, "third")).await.unwrap();

    assert_eq!(platform.performed(), ["slow first", "second", "third"]);
}

#[tokio::test]
async fn test_closed_dispatcher_is_reported() {
    let (tx, dispatcher) = channel(ScriptedPlatform::default(), 8);
    drop(dispatcher);

    assert!(tx.is_closed());
    assert_eq!(tx.post(text(1, "x")).await, Err(DispatchError::Closed));
    assert_eq!(tx.deliver(text(1, "x")).await.unwrap_err(), DispatchError::Closed);
}

#[tokio::test]
async fn test_dispatcher_stops_when_all_senders_drop() {
    let (tx, dispatcher) = channel(ScriptedPlatform::default(), 8);
    let task = tokio::spawn(dispatcher.run());

    let clone = tx.clone();
    drop(tx);
    clone.post(text(1, "still open")).await.unwrap();
    drop(clone);

    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("dispatcher should stop")
        .unwrap();
}

#[tokio::test]
async fn test_memory_platform_probe_flow() {
    let platform = MemoryPlatform::new();
    platform.block(UserId(9));
    let (tx, dispatcher) = channel(platform.clone(), 8);
    tokio::spawn(dispatcher.run());

    let err = tx.deliver(SendMessage::new(UserId(9), "welcome")).await.unwrap_err();
    assert!(matches!(err, DispatchError::Platform(PlatformError::Forbidden(_))));

    let ok = tx.deliver(SendMessage::new(UserId(10), "welcome")).await.unwrap();
    assert_eq!(ok.chat_id, ChatId(10));

    let lobby = tx.deliver(text(-1, "lobby")).await.unwrap();
    tx.deliver(EditMessage::new(ChatId(-1), lobby.message_id, "lobby v2"))
        .await
        .unwrap();
    assert_eq!(platform.texts_in(ChatId(-1)), ["lobby", "lobby v2"]);
}
