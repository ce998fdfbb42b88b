//! JSON-lines notification sink.

use chrono::{DateTime, Utc};
use peek_poker::{Notification, NotificationSink};
use serde::Serialize;
use std::{
    io::Write,
    sync::{Mutex, PoisonError},
};

#[derive(Serialize)]
struct Record<'a> {
    at: DateTime<Utc>,
    #[serde(flatten)]
    notification: &'a Notification,
}

/// Writes each notification as one JSON object per line. Private
/// notifications carry card values, so they are skipped unless asked for.
pub struct JsonLinesSink {
    writer: Mutex<Box<dyn Write + Send>>,
    include_private: bool,
}

impl JsonLinesSink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            include_private: false,
        }
    }

    #[must_use]
    pub fn with_private(mut self, include_private: bool) -> Self {
        self.include_private = include_private;
        self
    }
}

impl NotificationSink for JsonLinesSink {
    fn publish(&self, notification: Notification) {
        if !notification.is_public() && !self.include_private {
            return;
        }

        let record = Record {
            at: Utc::now(),
            notification: &notification,
        };
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = write_line(&mut **writer, &record) {
            log::warn!(
                "Failed to write game {} notification: {}",
                notification.game_id,
                e
            );
        }
    }
}

fn write_line(writer: &mut dyn Write, record: &Record<'_>) -> std::io::Result<()> {
    serde_json::to_writer(&mut *writer, record)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use peek_poker::{ActionKind, GameEvent, PlayerId};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn lines(&self) -> Vec<serde_json::Value> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    fn private_action() -> Notification {
        let alice = PlayerId::new("alice");
        Notification::private(
            4,
            alice.clone(),
            GameEvent::PlayerAction {
                player: alice,
                kind: ActionKind::Bet,
                amount: 5,
            },
        )
    }

    #[test]
    fn test_writes_public_notifications() {
        let buffer = SharedBuffer::default();
        let sink = JsonLinesSink::new(buffer.clone());
        sink.publish(Notification::public(4, GameEvent::ShowdownStarted));
        sink.publish(private_action());

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["game_id"], 4);
        assert_eq!(lines[0]["visibility"], "Public");
        assert_eq!(lines[0]["event"], "ShowdownStarted");
        assert!(lines[0]["at"].is_string());
    }

    #[test]
    fn test_private_notifications_on_request() {
        let buffer = SharedBuffer::default();
        let sink = JsonLinesSink::new(buffer.clone()).with_private(true);
        sink.publish(private_action());

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["visibility"]["Private"], "alice");
        assert_eq!(lines[0]["event"]["PlayerAction"]["amount"], 5);
    }
}
