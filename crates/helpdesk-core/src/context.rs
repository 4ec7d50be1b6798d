use std::time::{Duration, Instant};

use uuid::Uuid;

use helpdesk_db::{Department, HelpRecord, Location, Section};

/// What the person wants to do with the help desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Save,
    Find,
}

impl Action {
    pub const ALL: [Action; 2] = [Action::Save, Action::Find];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Save => "Save",
            Action::Find => "Find",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Save" => Ok(Action::Save),
            "Find" => Ok(Action::Find),
            _ => Err(format!("Unknown action: {}", s)),
        }
    }
}

/// Session-scoped accumulator for the intake flow.
///
/// Owned by the flow loop; each step fills in exactly its own field. The
/// context is dropped without a trace when the session ends unsaved.
#[derive(Debug)]
pub struct FlowContext {
    pub session_id: Uuid,
    pub action: Option<Action>,
    pub department: Option<Department>,
    pub section: Option<Section>,
    pub location: Option<Location>,
    pub details: Option<String>,
    started_at: Instant,
}

impl FlowContext {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            action: None,
            department: None,
            section: None,
            location: None,
            details: None,
            started_at: Instant::now(),
        }
    }

    pub fn total_duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Assemble the record once every save-path field has been collected.
    pub fn help_record(&self) -> Option<HelpRecord> {
        Some(HelpRecord {
            department: self.department?,
            section: self.section?,
            location: self.location?,
            details: self.details.clone()?,
        })
    }
}

impl Default for FlowContext {
    fn default() -> Self {
        Self::new()
    }
}
