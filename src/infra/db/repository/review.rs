use super::{DbConn, lock};
use crate::domain::{
    EmployeeId, EmployeeLookup, Review, ReviewError, ReviewField, ReviewId, SharedReview,
    ValidationError, validate_employee_id, validate_summary, validate_year,
};
use rusqlite::Row;
use rusqlite::types::Value;
use std::collections::HashMap;
use std::rc::Rc;

const SELECT_ALL_SQL: &str = "SELECT id, year, summary, employee_id FROM reviews";
const SELECT_BY_ID_SQL: &str = "SELECT id, year, summary, employee_id FROM reviews WHERE id = ?1";

/// A raw `reviews` row as stored, before validation.
///
/// Column values are kept untyped so that a wrongly typed cell is reported as
/// an invalid field instead of a conversion failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRow {
    pub id: ReviewId,
    pub year: Value,
    pub summary: Value,
    pub employee_id: Value,
}

impl ReviewRow {
    pub fn new(
        id: ReviewId,
        year: impl Into<Value>,
        summary: impl Into<Value>,
        employee_id: impl Into<Value>,
    ) -> Self {
        Self {
            id,
            year: year.into(),
            summary: summary.into(),
            employee_id: employee_id.into(),
        }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            year: row.get(1)?,
            summary: row.get(2)?,
            employee_id: row.get(3)?,
        })
    }
}

/// Unit of work over the `reviews` table.
///
/// Holds the identity map for the reviews it has loaded or saved: one shared
/// instance per row id for as long as the repository lives. Every mutation is
/// a single autocommitted statement.
pub struct ReviewRepository<L> {
    conn: DbConn,
    lookup: L,
    identity_map: HashMap<ReviewId, SharedReview>,
}

impl<L: EmployeeLookup> ReviewRepository<L> {
    pub fn new(conn: DbConn, lookup: L) -> Self {
        Self {
            conn,
            lookup,
            identity_map: HashMap::new(),
        }
    }

    /// Employee lookup used for validation, for use with
    /// [`Review::set_employee_id`].
    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    pub fn create_table(&self) -> Result<(), ReviewError> {
        let conn = lock(&self.conn);
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY,
                year INT,
                summary TEXT,
                employee_id INTEGER,
                FOREIGN KEY (employee_id) REFERENCES employee(id)
            );
            "#,
        )?;
        log::debug!("Ensured reviews table exists");
        Ok(())
    }

    /// Drop the table. Every tracked instance loses its row, so each one is
    /// detached (id cleared) and the identity map is emptied.
    pub fn drop_table(&mut self) -> Result<(), ReviewError> {
        {
            let conn = lock(&self.conn);
            conn.execute_batch("DROP TABLE IF EXISTS reviews;")?;
        }
        for (_, review) in self.identity_map.drain() {
            review.borrow_mut().set_id(None);
        }
        log::debug!("Dropped reviews table");
        Ok(())
    }

    /// Validate and persist a new review in one step.
    pub fn create(
        &mut self,
        year: i64,
        summary: impl Into<String>,
        employee_id: EmployeeId,
    ) -> Result<SharedReview, ReviewError> {
        let review = Review::new(year, summary, employee_id, &self.lookup)?.into_shared();
        self.save(&review)?;
        Ok(review)
    }

    /// Insert a transient review, assign its id and start tracking it.
    pub fn save(&mut self, review: &SharedReview) -> Result<ReviewId, ReviewError> {
        let id = {
            let current = review.borrow();
            if let Some(id) = current.id() {
                return Err(ReviewError::AlreadyPersisted(id));
            }
            let conn = lock(&self.conn);
            conn.execute(
                "INSERT INTO reviews (year, summary, employee_id) VALUES (?1, ?2, ?3)",
                rusqlite::params![current.year(), current.summary(), current.employee_id()],
            )?;
            conn.last_insert_rowid()
        };

        review.borrow_mut().set_id(Some(id));
        if let Some(stale) = self.identity_map.insert(id, Rc::clone(review)) {
            // SQLite handed out the id of a row removed behind our back.
            log::warn!("Review id {} reused by storage; detaching stale instance", id);
            stale.borrow_mut().set_id(None);
        }
        log::debug!("Inserted review {}", id);
        Ok(id)
    }

    /// Turn a stored row into the live instance for its id.
    ///
    /// A tracked instance is overwritten with the row's values and returned;
    /// otherwise a new instance is built and tracked. Every value is validated
    /// first, so a rejected row leaves the tracked instance untouched.
    pub fn instance_from_db(&mut self, row: ReviewRow) -> Result<SharedReview, ReviewError> {
        let year = year_from_value(row.year)?;
        let summary = summary_from_value(row.summary)?;
        let employee_id = employee_id_from_value(row.employee_id, &self.lookup)?;

        if let Some(existing) = self.identity_map.get(&row.id) {
            existing.borrow_mut().reconcile(year, summary, employee_id);
            log::trace!("Reconciled tracked review {}", row.id);
            return Ok(Rc::clone(existing));
        }

        let review = Review::from_validated(row.id, year, summary, employee_id).into_shared();
        self.identity_map.insert(row.id, Rc::clone(&review));
        Ok(review)
    }

    pub fn find_by_id(&mut self, id: ReviewId) -> Result<Option<SharedReview>, ReviewError> {
        // The lookup may share this connection, so release it before reconciling.
        let row = {
            let conn = lock(&self.conn);
            let mut stmt = conn.prepare(SELECT_BY_ID_SQL)?;
            let mut rows = stmt.query_map([id], ReviewRow::from_row)?;
            rows.next().transpose()?
        };

        row.map(|row| self.instance_from_db(row)).transpose()
    }

    /// Write the review's current fields to its row.
    ///
    /// Only instances tracked by this repository can be updated.
    pub fn update(&self, review: &SharedReview) -> Result<(), ReviewError> {
        let current = review.borrow();
        let id = current.id().ok_or(ReviewError::NotPersisted)?;
        if !self.tracks(id, review) {
            return Err(ReviewError::NotFound(format!(
                "review {} is not tracked by this repository",
                id
            )));
        }

        let conn = lock(&self.conn);
        let affected = conn.execute(
            "UPDATE reviews SET year = ?1, summary = ?2, employee_id = ?3 WHERE id = ?4",
            rusqlite::params![current.year(), current.summary(), current.employee_id(), id],
        )?;
        if affected == 0 {
            return Err(ReviewError::NotFound(format!("no row with id {}", id)));
        }
        log::debug!("Updated review {}", id);
        Ok(())
    }

    /// Delete the review's row, stop tracking it and clear its id.
    ///
    /// Only instances tracked by this repository can be deleted.
    pub fn delete(&mut self, review: &SharedReview) -> Result<(), ReviewError> {
        let id = review
            .borrow()
            .id()
            .ok_or_else(|| ReviewError::NotFound("review has no id".to_string()))?;
        if !self.tracks(id, review) {
            return Err(ReviewError::NotFound(format!(
                "review {} is not tracked by this repository",
                id
            )));
        }

        {
            let conn = lock(&self.conn);
            conn.execute("DELETE FROM reviews WHERE id = ?1", [id])?;
        }

        self.identity_map.remove(&id);
        review.borrow_mut().set_id(None);
        log::debug!("Deleted review {}", id);
        Ok(())
    }

    /// Every stored review, in the order SQLite returns them.
    pub fn get_all(&mut self) -> Result<Vec<SharedReview>, ReviewError> {
        let rows = {
            let conn = lock(&self.conn);
            let mut stmt = conn.prepare(SELECT_ALL_SQL)?;
            let rows = stmt.query_map([], ReviewRow::from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        rows.into_iter()
            .map(|row| self.instance_from_db(row))
            .collect()
    }

    fn tracks(&self, id: ReviewId, review: &SharedReview) -> bool {
        self.identity_map
            .get(&id)
            .is_some_and(|entry| Rc::ptr_eq(entry, review))
    }

    pub fn is_tracked(&self, id: ReviewId) -> bool {
        self.identity_map.contains_key(&id)
    }

    pub fn tracked_len(&self) -> usize {
        self.identity_map.len()
    }

    /// End the unit of work: forget every tracked instance. Storage is not touched.
    pub fn clear(&mut self) {
        self.identity_map.clear();
    }
}

fn year_from_value(value: Value) -> Result<i64, ValidationError> {
    match value {
        Value::Integer(year) => validate_year(year),
        other => Err(wrong_type(ReviewField::Year, "an integer", &other)),
    }
}

fn summary_from_value(value: Value) -> Result<String, ValidationError> {
    match value {
        Value::Text(summary) => validate_summary(summary),
        other => Err(wrong_type(ReviewField::Summary, "a string", &other)),
    }
}

fn employee_id_from_value<L>(value: Value, lookup: &L) -> Result<EmployeeId, ValidationError>
where
    L: EmployeeLookup + ?Sized,
{
    match value {
        Value::Integer(id) => validate_employee_id(id, lookup),
        other => Err(wrong_type(ReviewField::EmployeeId, "an integer", &other)),
    }
}

fn wrong_type(field: ReviewField, expected: &str, found: &Value) -> ValidationError {
    ValidationError::invalid(
        field,
        format!("expected {}, found {}", expected, found.data_type()),
    )
}
