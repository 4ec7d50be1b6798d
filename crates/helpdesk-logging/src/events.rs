use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Structured log events for the intake flow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    SessionStarted {
        session_id: String,
    },
    StepEntered {
        step: String,
    },
    /// An answer outside the offered set was rejected and the step re-prompted
    ChoiceRejected {
        step: String,
        answer: String,
    },
    /// A blank details answer was rejected and the step re-prompted
    DetailsRejected,
    RecordSaved {
        id: i64,
        department: String,
        section: String,
        location: String,
    },
    RecordDiscarded,
    LookupCompleted {
        department: String,
        section: String,
        matches: usize,
    },
    StorageUnavailable {
        error: String,
    },
    SessionEnded {
        outcome: String,
        duration_secs: f64,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Logger for flow events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            file_writer: None,
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn log(&self, event: &LogEvent) {
        // Log to file if configured (always JSON format for file)
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        // Log to console based on format
        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::SessionStarted { session_id } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{} {}",
                    "helpdesk".bold().bright_white(),
                    format!("session {}", session_id).dimmed()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::StepEntered { .. } => {
                // Skip in pretty mode - it's debug info
            }
            LogEvent::ChoiceRejected { step, answer } => {
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "✗".bright_yellow(),
                    format!("rejected answer for {}: {}", step, answer).dimmed()
                );
            }
            LogEvent::DetailsRejected => {
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "✗".bright_yellow(),
                    "rejected empty details".dimmed()
                );
            }
            LogEvent::RecordSaved {
                id,
                department,
                section,
                ..
            } => {
                let _ = writeln!(
                    stderr,
                    "  {} Saved record #{} ({} / {})",
                    "✓".bright_green(),
                    id,
                    department,
                    section
                );
            }
            LogEvent::RecordDiscarded => {
                let _ = writeln!(stderr, "  {} Record discarded", "—".bright_yellow());
            }
            LogEvent::LookupCompleted {
                department,
                section,
                matches,
            } => {
                let _ = writeln!(
                    stderr,
                    "  {} {} {} for {} / {}",
                    "→".bright_cyan(),
                    matches,
                    if *matches == 1 { "record" } else { "records" },
                    department,
                    section
                );
            }
            LogEvent::StorageUnavailable { error } => {
                let _ = writeln!(
                    stderr,
                    "  {} Storage error: {}",
                    "✗".bright_red(),
                    error.bright_red()
                );
            }
            LogEvent::SessionEnded { .. } => {
                // This is handled by the final outcome printing in main.rs
                // We skip it here to avoid duplication
            }
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        let msg = match event {
            LogEvent::SessionStarted { session_id } => {
                format!("[{}] session:start {}", timestamp, session_id)
            }
            LogEvent::StepEntered { step } => format!("[{}] step:{}", timestamp, step),
            LogEvent::ChoiceRejected { step, answer } => {
                format!("[{}] reject:{} {}", timestamp, step, answer)
            }
            LogEvent::DetailsRejected => format!("[{}] reject:details", timestamp),
            LogEvent::RecordSaved { id, .. } => format!("[{}] save:#{}", timestamp, id),
            LogEvent::RecordDiscarded => format!("[{}] discard", timestamp),
            LogEvent::LookupCompleted { matches, .. } => {
                format!("[{}] find:{}", timestamp, matches)
            }
            LogEvent::StorageUnavailable { error } => {
                format!("[{}] storage:error {}", timestamp, error)
            }
            LogEvent::SessionEnded {
                outcome,
                duration_secs,
            } => format!(
                "[{}] session:end:{} {:.1}s",
                timestamp, outcome, duration_secs
            ),
        };
        let _ = writeln!(stderr, "{}", msg);
    }
}
