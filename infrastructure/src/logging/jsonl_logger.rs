//! JSONL file writer for panel transcripts.
//!
//! Each [`ConversationEvent`] becomes a single JSON line: the payload's
//! fields plus `type` and an RFC3339 `timestamp`.

use chrono::{SecondsFormat, Utc};
use panel_application::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Appends one JSON object per line to a transcript file.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every record
/// and on `Drop`.
pub struct JsonlConversationLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlConversationLogger {
    /// Open (or create) the log at `path` for appending.
    ///
    /// Creates parent directories as needed. Returns `None`, after a
    /// warning, if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create conversation log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(
                    "Could not open conversation log file {}: {}",
                    path.display(),
                    e
                );
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// A fresh, timestamp-named log inside `dir`
    /// (`panel-20250101T120000Z.jsonl`).
    pub fn in_dir(dir: impl AsRef<Path>) -> Option<Self> {
        let name = format!("panel-{}.jsonl", Utc::now().format("%Y%m%dT%H%M%S%.3fZ"));
        Self::new(dir.as_ref().join(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Merge `type` and `timestamp` into the payload. Non-object payloads are
/// nested under `data`.
fn to_record(event: ConversationEvent, timestamp: String) -> Value {
    let mut record = match event.payload {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };
    record.insert("type".to_string(), Value::from(event.event_type));
    record.insert("timestamp".to_string(), Value::String(timestamp));
    Value::Object(record)
}

impl ConversationLogger for JsonlConversationLogger {
    fn log(&self, event: ConversationEvent) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let record = to_record(event, timestamp);

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        match self.writer.lock() {
            Ok(mut writer) => {
                if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
                    warn!("Conversation log write failed ({}): {}", self.path.display(), e);
                }
            }
            Err(_) => warn!("Conversation log writer poisoned; dropping event"),
        }
    }
}

impl Drop for JsonlConversationLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_domain::{PanelConfiguration, PanelMember, PanelPhase, PanelSession, SessionId};

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn session() -> PanelSession {
        let config = PanelConfiguration::new(
            "Should the city build a tram?",
            vec![
                PanelMember::new("econ", "Dr. Econ", "Economist", "persona"),
                PanelMember::new("plan", "Dr. Plan", "Urban planner", "persona"),
            ],
        );
        PanelSession::new(SessionId::new("s-1"), config).unwrap()
    }

    #[test]
    fn test_writes_one_record_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.jsonl");
        let logger = JsonlConversationLogger::new(&path).unwrap();

        let mut session = session();
        logger.log(ConversationEvent::panel_started(&session));
        session.advance_to(PanelPhase::OpeningStatements).unwrap();
        let utterance = session.record("econ", "Costs are high.").unwrap().clone();
        logger.log(ConversationEvent::utterance(session.id(), "econ", &utterance));
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["type"], "panel_started");
        assert_eq!(records[0]["session_id"], "s-1");
        assert_eq!(records[0]["members"][1]["id"], "plan");
        assert_eq!(records[1]["type"], "utterance");
        assert_eq!(records[1]["phase"], "opening_statements");
        assert_eq!(records[1]["content"], "Costs are high.");
        for record in &records {
            let ts = record["timestamp"].as_str().unwrap();
            assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
        }
    }

    #[test]
    fn test_non_object_payload_is_nested() {
        let record = to_record(
            ConversationEvent::new("note", serde_json::json!("just a string")),
            "2025-01-01T00:00:00.000Z".to_string(),
        );
        assert_eq!(record["type"], "note");
        assert_eq!(record["data"], "just a string");
        assert_eq!(record["timestamp"], "2025-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_reopening_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/log.jsonl");

        for _ in 0..2 {
            let logger = JsonlConversationLogger::new(&path).unwrap();
            logger.log(ConversationEvent::panel_failed(
                &SessionId::new("s-2"),
                "provider down",
            ));
        }

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["error"], "provider down");
    }

    #[test]
    fn test_in_dir_names_file_after_time() {
        let dir = tempfile::tempdir().unwrap();
        let logger = JsonlConversationLogger::in_dir(dir.path()).unwrap();
        let name = logger.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("panel-"));
        assert!(name.ends_with(".jsonl"));
    }
}
