//! Append-only structured event stream
//!
//! Every significant step in the control plane emits one flat JSON record
//! (action, status, timestamp, action-specific fields) to a JSONL file.
//! Writes are serialized behind an async mutex so concurrent requests
//! never interleave partial lines; each append is one complete record.
//! Records are mirrored to `tracing` for live observability.

use std::path::Path;

use chrono::Local;
use serde_json::{Map, Value, json};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// One structured event record, before the timestamp is stamped on
#[derive(Debug, Clone)]
pub struct Event {
    action: String,
    status: String,
    fields: Map<String, Value>,
}

impl Event {
    pub fn new(action: &str, status: &str) -> Self {
        Self {
            action: action.to_string(),
            status: status.to_string(),
            fields: Map::new(),
        }
    }

    /// Attach an action-specific field
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }
}

/// Durable JSONL sink shared by every component
pub struct EventLog {
    file: Mutex<File>,
}

impl EventLog {
    /// Open (or create) the event log in append mode
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Append one event as a single complete line.
    ///
    /// Logging must never take down a request that otherwise succeeded,
    /// so sink errors are reported via tracing and swallowed.
    pub async fn append(&self, event: Event) {
        let mut record = json!({
            "action": event.action,
            "status": event.status,
            "timestamp": Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        });

        if let Some(obj) = record.as_object_mut() {
            for (k, v) in event.fields {
                obj.insert(k, v);
            }
        }

        info!(action = %event.action, status = %event.status, "event");

        let mut line = record.to_string();
        line.push('\n');

        let mut file = self.file.lock().await;
        if let Err(e) = file.write_all(line.as_bytes()).await {
            warn!("Failed to append event record: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_one_json_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        let log = EventLog::open(&path).await.unwrap();
        log.append(Event::new("server_start", "running")).await;
        log.append(
            Event::new("send_prompt", "sent").field("session_id", "abc123"),
        )
        .await;

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["action"], "server_start");
        assert_eq!(first["status"], "running");
        assert!(first["timestamp"].is_string());

        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["session_id"], "abc123");
    }

    #[tokio::test]
    async fn reopening_appends_rather_than_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        {
            let log = EventLog::open(&path).await.unwrap();
            log.append(Event::new("a", "ok")).await;
        }
        {
            let log = EventLog::open(&path).await.unwrap();
            log.append(Event::new("b", "ok")).await;
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
