use super::{DbConn, lock};
use crate::domain::{EmployeeId, EmployeeLookup};
use rusqlite::OptionalExtension;

/// Employee existence check backed by the `employee` table.
pub struct SqliteEmployeeLookup {
    conn: DbConn,
}

impl SqliteEmployeeLookup {
    pub fn new(conn: DbConn) -> Self {
        Self { conn }
    }
}

impl EmployeeLookup for SqliteEmployeeLookup {
    fn employee_exists(&self, id: EmployeeId) -> anyhow::Result<bool> {
        let conn = lock(&self.conn);
        let found = conn
            .query_row("SELECT 1 FROM employee WHERE id = ?1", [id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }
}
