use serde::{Deserialize, Serialize};
use std::time::Duration;

use helpdesk_db::{Department, HelpRecord, RecordId, Section, StoredRecord};

use crate::flow_runner::FlowStep;

/// The final outcome of one intake session
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FlowOutcome {
    /// The record was confirmed and persisted
    Saved {
        id: RecordId,
        record: HelpRecord,
        duration_secs: f64,
    },
    /// The person declined at confirmation; nothing was persisted
    Discarded { duration_secs: f64 },
    /// Lookup path: matching records were retrieved and presented
    Found {
        department: Department,
        section: Section,
        matches: Vec<StoredRecord>,
        duration_secs: f64,
    },
    /// The session ended before reaching a terminal answer
    Abandoned { step: FlowStep, duration_secs: f64 },
}

impl FlowOutcome {
    pub fn saved(id: RecordId, record: HelpRecord, duration: Duration) -> Self {
        Self::Saved {
            id,
            record,
            duration_secs: duration.as_secs_f64(),
        }
    }

    pub fn discarded(duration: Duration) -> Self {
        Self::Discarded {
            duration_secs: duration.as_secs_f64(),
        }
    }

    pub fn found(
        department: Department,
        section: Section,
        matches: Vec<StoredRecord>,
        duration: Duration,
    ) -> Self {
        Self::Found {
            department,
            section,
            matches,
            duration_secs: duration.as_secs_f64(),
        }
    }

    pub fn abandoned(step: FlowStep, duration: Duration) -> Self {
        Self::Abandoned {
            step,
            duration_secs: duration.as_secs_f64(),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Saved { .. } => "saved",
            Self::Discarded { .. } => "discarded",
            Self::Found { .. } => "found",
            Self::Abandoned { .. } => "abandoned",
        }
    }

    pub fn duration_secs(&self) -> f64 {
        match self {
            Self::Saved { duration_secs, .. } => *duration_secs,
            Self::Discarded { duration_secs } => *duration_secs,
            Self::Found { duration_secs, .. } => *duration_secs,
            Self::Abandoned { duration_secs, .. } => *duration_secs,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Saved { .. } | Self::Discarded { .. } | Self::Found { .. } => 0,
            Self::Abandoned { .. } => 130,
        }
    }
}
