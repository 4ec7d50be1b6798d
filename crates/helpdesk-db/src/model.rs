//! Domain model for help desk records.
//!
//! Every enumeration persists and compares through its canonical string
//! name. Raw ordinals never cross the storage boundary.

use serde::{Deserialize, Serialize};

/// Identifier assigned by the store when a record is inserted.
pub type RecordId = i64;

/// A department a help record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Department {
    #[serde(rename = "HR")]
    Hr,
    Healthcare,
    Finance,
}

impl Department {
    pub const ALL: [Department; 3] = [
        Department::Hr,
        Department::Healthcare,
        Department::Finance,
    ];

    /// Canonical name, used for prompts, persistence, and comparisons.
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Hr => "HR",
            Department::Healthcare => "Healthcare",
            Department::Finance => "Finance",
        }
    }

    /// The sections that belong to this department.
    pub fn sections(&self) -> &'static [Section] {
        match self {
            Department::Hr => &[
                Section::Recruitment,
                Section::Holidays,
                Section::Escalation,
                Section::Policy,
            ],
            Department::Healthcare => &[
                Section::Doctor,
                Section::Medicine,
                Section::Bed,
                Section::Oxygen,
                Section::Mediclaim,
            ],
            Department::Finance => &[Section::Salary, Section::Tax, Section::Loan],
        }
    }
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Department {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HR" => Ok(Department::Hr),
            "Healthcare" => Ok(Department::Healthcare),
            "Finance" => Ok(Department::Finance),
            _ => Err(format!("Unknown department: {}", s)),
        }
    }
}

/// A section within a department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    // HR
    Recruitment,
    Holidays,
    Escalation,
    Policy,
    // Healthcare
    Doctor,
    Medicine,
    Bed,
    Oxygen,
    Mediclaim,
    // Finance
    Salary,
    Tax,
    Loan,
}

impl Section {
    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Recruitment => "Recruitment",
            Section::Holidays => "Holidays",
            Section::Escalation => "Escalation",
            Section::Policy => "Policy",
            Section::Doctor => "Doctor",
            Section::Medicine => "Medicine",
            Section::Bed => "Bed",
            Section::Oxygen => "Oxygen",
            Section::Mediclaim => "Mediclaim",
            Section::Salary => "Salary",
            Section::Tax => "Tax",
            Section::Loan => "Loan",
        }
    }

    /// The department this section belongs to.
    pub fn department(&self) -> Department {
        match self {
            Section::Recruitment | Section::Holidays | Section::Escalation | Section::Policy => {
                Department::Hr
            }
            Section::Doctor
            | Section::Medicine
            | Section::Bed
            | Section::Oxygen
            | Section::Mediclaim => Department::Healthcare,
            Section::Salary | Section::Tax | Section::Loan => Department::Finance,
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Recruitment" => Ok(Section::Recruitment),
            "Holidays" => Ok(Section::Holidays),
            "Escalation" => Ok(Section::Escalation),
            "Policy" => Ok(Section::Policy),
            "Doctor" => Ok(Section::Doctor),
            "Medicine" => Ok(Section::Medicine),
            "Bed" => Ok(Section::Bed),
            "Oxygen" => Ok(Section::Oxygen),
            "Mediclaim" => Ok(Section::Mediclaim),
            "Salary" => Ok(Section::Salary),
            "Tax" => Ok(Section::Tax),
            "Loan" => Ok(Section::Loan),
            _ => Err(format!("Unknown section: {}", s)),
        }
    }
}

/// An office location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Pune,
    Gurgaon,
    Chennai,
    Bangalore,
}

impl Location {
    pub const ALL: [Location; 4] = [
        Location::Pune,
        Location::Gurgaon,
        Location::Chennai,
        Location::Bangalore,
    ];

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Pune => "Pune",
            Location::Gurgaon => "Gurgaon",
            Location::Chennai => "Chennai",
            Location::Bangalore => "Bangalore",
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pune" => Ok(Location::Pune),
            "Gurgaon" => Ok(Location::Gurgaon),
            "Chennai" => Ok(Location::Chennai),
            "Bangalore" => Ok(Location::Bangalore),
            _ => Err(format!("Unknown location: {}", s)),
        }
    }
}

/// The unit of information collected by the intake flow and persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpRecord {
    pub department: Department,
    pub section: Section,
    pub location: Location,
    pub details: String,
}

impl HelpRecord {
    /// Whether the record's section belongs to its department.
    pub fn section_matches_department(&self) -> bool {
        self.department.sections().contains(&self.section)
    }
}

/// A persisted help record with its assigned identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    pub department: Department,
    pub section: Section,
    pub location: Location,
    pub details: String,
}
