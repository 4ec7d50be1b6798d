//! Records store over the `facility_data` table.

use std::str::FromStr;
use std::sync::MutexGuard;

use rusqlite::{params, Connection};
use thiserror::Error;

use crate::model::{Department, HelpRecord, RecordId, Section, StoredRecord};

/// Errors from the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be opened or the statement could not be executed.
    #[error("record store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),

    /// A record reached the store with a section outside its department's
    /// set. The write fails as a whole; nothing is committed.
    #[error("section {section} does not belong to department {department}")]
    SectionOutsideDepartment {
        department: Department,
        section: Section,
    },
}

/// Records store with a borrowed connection.
pub struct Records<'db> {
    conn: MutexGuard<'db, Connection>,
}

impl<'db> Records<'db> {
    pub(crate) fn new(conn: MutexGuard<'db, Connection>) -> Self {
        Self { conn }
    }

    /// Insert a record, returning the assigned id.
    ///
    /// The four fields are persisted as their canonical names. A single-row
    /// insert is atomic: a failed attempt leaves the table unchanged.
    pub fn insert(&self, record: &HelpRecord) -> Result<RecordId, StoreError> {
        if !record.section_matches_department() {
            return Err(StoreError::SectionOutsideDepartment {
                department: record.department,
                section: record.section,
            });
        }

        self.conn.execute(
            r#"
            INSERT INTO facility_data (department, section, location, details)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                record.department.as_str(),
                record.section.as_str(),
                record.location.as_str(),
                record.details,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    /// All records matching both keys exactly, in insertion order.
    ///
    /// An empty result is a normal outcome, not an error.
    pub fn find_by_department_and_section(
        &self,
        department: Department,
        section: Section,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, department, section, location, details
            FROM facility_data
            WHERE department = ?1 AND section = ?2
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(
            params![department.as_str(), section.as_str()],
            Self::row_to_record,
        )?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        Ok(records)
    }

    /// Total number of persisted records.
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM facility_data", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn row_to_record(row: &rusqlite::Row) -> Result<StoredRecord, rusqlite::Error> {
        Ok(StoredRecord {
            id: row.get(0)?,
            department: parse_name_column(row, 1)?,
            section: parse_name_column(row, 2)?,
            location: parse_name_column(row, 3)?,
            details: row.get(4)?,
        })
    }
}

/// Parse a canonical enumeration name out of a text column.
///
/// A row holding a name this build does not know is reported as a
/// conversion failure, never coerced to some other member.
fn parse_name_column<T: FromStr>(row: &rusqlite::Row, idx: usize) -> Result<T, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unrecognized enumeration name: {}", raw).into(),
        )
    })
}
