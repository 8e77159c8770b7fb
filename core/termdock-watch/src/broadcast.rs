//! Snapshot broadcast boundary.
//!
//! Consumers of session snapshots (dashboard renderer, WebSocket mirror)
//! attach as sinks. Sinks get a read-only view per broadcast; a failing sink
//! is logged and skipped, it never stops the loop or the other sinks.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use termdock_core::Session;
use tracing::warn;

#[derive(Debug, Serialize)]
struct SnapshotFrame<'a> {
    broadcast_at: DateTime<Utc>,
    sessions: &'a [Session],
}

pub trait SnapshotSink {
    fn name(&self) -> &'static str;
    fn publish(&mut self, sessions: &[Session]) -> Result<(), String>;
}

/// Writes one JSON object per broadcast, newline-delimited. This is the wire
/// format the dashboard and the mobile mirror both consume.
pub struct JsonLinesSink<W> {
    writer: W,
}

impl JsonLinesSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        JsonLinesSink {
            writer: std::io::stdout(),
        }
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink { writer }
    }
}

impl<W: Write> SnapshotSink for JsonLinesSink<W> {
    fn name(&self) -> &'static str {
        "json-lines"
    }

    fn publish(&mut self, sessions: &[Session]) -> Result<(), String> {
        let frame = SnapshotFrame {
            broadcast_at: Utc::now(),
            sessions,
        };
        let line =
            serde_json::to_string(&frame).map_err(|e| format!("serialize failed: {}", e))?;
        writeln!(self.writer, "{}", line).map_err(|e| format!("write failed: {}", e))?;
        self.writer
            .flush()
            .map_err(|e| format!("flush failed: {}", e))
    }
}

/// Pushes one snapshot to every sink.
pub fn broadcast(sinks: &mut [Box<dyn SnapshotSink>], sessions: &[Session]) {
    for sink in sinks {
        if let Err(err) = sink.publish(sessions) {
            warn!(sink = sink.name(), error = %err, "Snapshot sink failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termdock_core::{SessionSource, SessionStatus};

    fn session(id: &str) -> Session {
        let now = Utc::now();
        Session {
            session_id: id.to_string(),
            cwd: "/tmp".to_string(),
            tty: None,
            status: SessionStatus::Running,
            source: SessionSource::Hook,
            created_at: now,
            updated_at: now,
            last_message: None,
            tab_name: None,
        }
    }

    #[test]
    fn test_json_lines_sink_emits_one_line_per_broadcast() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.publish(&[session("a"), session("b")]).unwrap();
        sink.publish(&[session("a")]).unwrap();

        let out = String::from_utf8(sink.writer).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);

        let frame: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(frame["sessions"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_tab_name_reaches_the_wire() {
        let mut enriched = session("a");
        enriched.tab_name = Some("vim".to_string());

        let mut sink = JsonLinesSink::new(Vec::new());
        sink.publish(&[enriched, session("b")]).unwrap();

        let out = String::from_utf8(sink.writer).unwrap();
        let frame: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(frame["sessions"][0]["tab_name"], "vim");
        // Unenriched sessions omit the field rather than sending null.
        assert!(frame["sessions"][1].get("tab_name").is_none());
    }

    #[test]
    fn test_failing_sink_does_not_stop_others() {
        struct Failing;
        impl SnapshotSink for Failing {
            fn name(&self) -> &'static str {
                "failing"
            }
            fn publish(&mut self, _sessions: &[Session]) -> Result<(), String> {
                Err("boom".to_string())
            }
        }

        struct Counting(std::sync::Arc<std::sync::atomic::AtomicUsize>);
        impl SnapshotSink for Counting {
            fn name(&self) -> &'static str {
                "counting"
            }
            fn publish(&mut self, _sessions: &[Session]) -> Result<(), String> {
                self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(())
            }
        }

        let count = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut sinks: Vec<Box<dyn SnapshotSink>> =
            vec![Box::new(Failing), Box::new(Counting(count.clone()))];
        broadcast(&mut sinks, &[session("a")]);
        assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
