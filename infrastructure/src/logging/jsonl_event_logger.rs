//! JSONL file writer for resolution events.
//!
//! Each [`ResolutionEvent`] is serialized as a single JSON line with a
//! `type` field and `timestamp` (plus `run_id` when set), appended to the
//! file via a buffered writer. Successive runs append to the same file.

use resolver_application::{ResolutionEvent, ResolutionEventLogger};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// JSONL event logger that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlEventLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
    run_id: Option<String>,
}

impl JsonlEventLogger {
    /// Open (or create) the log at `path` for appending.
    ///
    /// Creates parent directories if they don't exist.
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create event log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open event log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
            run_id: None,
        })
    }

    /// Tag every record with `run_id` so appended runs stay separable.
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(&self, event: ResolutionEvent) -> Value {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let mut map = match event.payload {
            Value::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        map.insert("type".to_string(), Value::String(event.event_type.to_string()));
        map.insert("timestamp".to_string(), Value::String(timestamp));
        if let Some(run_id) = &self.run_id {
            map.insert("run_id".to_string(), Value::String(run_id.clone()));
        }
        Value::Object(map)
    }
}

impl ResolutionEventLogger for JsonlEventLogger {
    fn log(&self, event: ResolutionEvent) {
        let Ok(line) = serde_json::to_string(&self.record(event)) else {
            return;
        };

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(writer, "{}", line);
        // Append-only: flush each record so a crash loses nothing
        let _ = writer.flush();
    }
}

impl Drop for JsonlEventLogger {
    fn drop(&mut self) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolver_application::ports::event_logger::{BARRIER_RESOLVED, TASK_STATUS_CHANGED};

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_record_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit").join("events.jsonl");
        let logger = JsonlEventLogger::new(&path).unwrap().with_run_id("run-1");

        logger.log(ResolutionEvent::new(
            TASK_STATUS_CHANGED,
            serde_json::json!({"task_id": "merge-a", "from": "PENDING", "to": "IN_PROGRESS"}),
        ));
        logger.log(ResolutionEvent::new(
            BARRIER_RESOLVED,
            serde_json::json!({"barrier": "implementation-complete", "triggered": true}),
        ));
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        for record in &records {
            assert!(record.get("timestamp").is_some());
            assert_eq!(record["run_id"], "run-1");
        }
        assert_eq!(records[0]["type"], TASK_STATUS_CHANGED);
        assert_eq!(records[0]["task_id"], "merge-a");
        assert_eq!(records[1]["type"], BARRIER_RESOLVED);
        assert_eq!(records[1]["triggered"], true);
    }

    #[test]
    fn test_non_object_payload_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let logger = JsonlEventLogger::new(&path).unwrap();

        logger.log(ResolutionEvent::new(
            TASK_STATUS_CHANGED,
            serde_json::json!("just a string"),
        ));
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records[0]["data"], "just a string");
        assert!(records[0].get("run_id").is_none());
    }

    #[test]
    fn test_successive_runs_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        for run in ["first", "second"] {
            let logger = JsonlEventLogger::new(&path).unwrap().with_run_id(run);
            logger.log(ResolutionEvent::new(BARRIER_RESOLVED, serde_json::json!({})));
        }

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["run_id"], "first");
        assert_eq!(records[1]["run_id"], "second");
    }

    #[test]
    fn test_returns_none_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        assert!(JsonlEventLogger::new(blocker.join("events.jsonl")).is_none());
    }
}
