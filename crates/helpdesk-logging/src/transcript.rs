use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Represents each line type in the session transcript JSONL file.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptLine {
    SessionStart {
        timestamp: DateTime<Utc>,
        session_id: String,
    },
    StepAnswered {
        timestamp: DateTime<Utc>,
        step: String,
        answer: String,
    },
    SessionEnd {
        timestamp: DateTime<Utc>,
        outcome: String,
        duration_secs: f64,
    },
}

/// Writes one session's turns as JSONL to ~/.local/share/helpdesk/sessions/.
///
/// Writes are best-effort: a transcript failure never fails the flow.
pub struct TranscriptWriter {
    file: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl TranscriptWriter {
    /// Create a new TranscriptWriter under the default sessions directory.
    /// The file name is the current UTC timestamp plus a short hash of the
    /// session id.
    pub fn new(session_id: &str) -> io::Result<Self> {
        Self::new_in(&Self::sessions_dir()?, session_id)
    }

    /// Create a new TranscriptWriter under a specific directory.
    pub fn new_in(dir: &Path, session_id: &str) -> io::Result<Self> {
        fs::create_dir_all(dir)?;

        let now = Utc::now();
        let timestamp_str = now.format("%Y-%m-%dT%H-%M-%SZ").to_string();

        let mut hasher = Sha256::new();
        hasher.update(session_id.as_bytes());
        let hash = hex::encode(hasher.finalize());
        let short_hash = &hash[..6];

        let filename = format!("{}_{}.jsonl", timestamp_str, short_hash);
        let path = dir.join(filename);

        let file = File::create(&path)?;
        let writer = BufWriter::new(file);

        Ok(Self {
            file: Mutex::new(writer),
            path,
        })
    }

    /// Returns the path to the transcript file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the session start line.
    pub fn write_start(&self, session_id: &str) {
        let line = TranscriptLine::SessionStart {
            timestamp: Utc::now(),
            session_id: session_id.to_string(),
        };
        self.write_line(&line);
    }

    /// Write an accepted step answer.
    pub fn write_answer(&self, step: &str, answer: &str) {
        let line = TranscriptLine::StepAnswered {
            timestamp: Utc::now(),
            step: step.to_string(),
            answer: answer.to_string(),
        };
        self.write_line(&line);
    }

    /// Write the session end line.
    pub fn write_end(&self, outcome: &str, duration_secs: f64) {
        let line = TranscriptLine::SessionEnd {
            timestamp: Utc::now(),
            outcome: outcome.to_string(),
            duration_secs,
        };
        self.write_line(&line);
    }

    fn write_line(&self, line: &TranscriptLine) {
        if let Ok(json) = serde_json::to_string(line) {
            if let Ok(mut writer) = self.file.lock() {
                let _ = writeln!(writer, "{}", json);
                let _ = writer.flush();
            }
        }
    }

    fn sessions_dir() -> io::Result<PathBuf> {
        let data_dir = dirs::data_dir().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine data directory",
            )
        })?;
        Ok(data_dir.join("helpdesk").join("sessions"))
    }
}
