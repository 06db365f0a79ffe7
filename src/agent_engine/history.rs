use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::PhoneClawResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub ts: i64,
    pub step: u32,
    pub role: String,
    pub content: Option<String>,
    pub action: Option<serde_json::Value>,
}

impl HistoryEntry {
    pub fn now(step: u32, role: &str) -> Self {
        Self {
            ts: chrono::Utc::now().timestamp_millis(),
            step,
            role: role.to_string(),
            content: None,
            action: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_action(mut self, action: serde_json::Value) -> Self {
        self.action = Some(action);
        self
    }
}

/// JSONL replay log of one task run. Never holds screenshots.
pub struct SessionHistory {
    pub session_id: String,
    entries: Vec<HistoryEntry>,
    file_path: PathBuf,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::in_dir(&default_session_dir())
    }

    pub fn in_dir(dir: &Path) -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();
        let file_path = dir.join(format!("session_{session_id}.jsonl"));
        Self {
            session_id,
            entries: Vec::new(),
            file_path,
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Records an entry and appends it to the JSONL file.
    pub fn record(&mut self, entry: HistoryEntry) -> PhoneClawResult<()> {
        self.entries.push(entry);
        self.flush()
    }

    /// Append the latest entry to the JSONL file.
    pub fn flush(&self) -> PhoneClawResult<()> {
        if let Some(last) = self.entries.last() {
            let line = serde_json::to_string(last)?;
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.file_path)?;
            writeln!(file, "{}", line)?;
            tracing::debug!(path = %self.file_path.display(), "history entry flushed");
        }
        Ok(())
    }
}

impl Default for SessionHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// `<data_local_dir>/phoneclaw/sessions`, falling back to the current directory.
pub fn default_session_dir() -> PathBuf {
    if let Some(base) = dirs::data_local_dir() {
        let d = base.join("phoneclaw").join("sessions");
        match std::fs::create_dir_all(&d) {
            Ok(()) => return d,
            Err(e) => tracing::warn!(path = %d.display(), error = %e, "cannot create session dir"),
        }
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
