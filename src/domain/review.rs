use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::employee::{EmployeeId, EmployeeLookup};
use super::error::{ReviewField, ValidationError};

/// Surrogate primary key of a `reviews` row.
pub type ReviewId = i64;

/// Earliest year a review may be filed for.
pub const MIN_REVIEW_YEAR: i64 = 2000;

/// Shared handle to a live review. A session hands out clones of the same
/// handle for the same row id.
pub type SharedReview = Rc<RefCell<Review>>;

/// A performance review for one employee and year.
///
/// Fields are private so that every assignment goes through validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    id: Option<ReviewId>,
    year: i64,
    summary: String,
    employee_id: EmployeeId,
}

impl Review {
    /// Build a transient review, validating every field.
    pub fn new<L>(
        year: i64,
        summary: impl Into<String>,
        employee_id: EmployeeId,
        lookup: &L,
    ) -> Result<Self, ValidationError>
    where
        L: EmployeeLookup + ?Sized,
    {
        Ok(Self {
            id: None,
            year: validate_year(year)?,
            summary: validate_summary(summary)?,
            employee_id: validate_employee_id(employee_id, lookup)?,
        })
    }

    /// Attach a known primary key, e.g. when rebuilding a review from a row.
    pub fn with_id(mut self, id: ReviewId) -> Self {
        self.id = Some(id);
        self
    }

    /// Assemble a review from values that already passed validation.
    pub(crate) fn from_validated(
        id: ReviewId,
        year: i64,
        summary: String,
        employee_id: EmployeeId,
    ) -> Self {
        Self {
            id: Some(id),
            year,
            summary,
            employee_id,
        }
    }

    pub fn into_shared(self) -> SharedReview {
        Rc::new(RefCell::new(self))
    }

    pub fn id(&self) -> Option<ReviewId> {
        self.id
    }

    pub fn year(&self) -> i64 {
        self.year
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn employee_id(&self) -> EmployeeId {
        self.employee_id
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn set_year(&mut self, year: i64) -> Result<(), ValidationError> {
        self.year = validate_year(year)?;
        Ok(())
    }

    pub fn set_summary(&mut self, summary: impl Into<String>) -> Result<(), ValidationError> {
        self.summary = validate_summary(summary)?;
        Ok(())
    }

    /// Reassign the employee. The id must resolve through `lookup` now; it is
    /// not re-checked if the employee is later removed.
    pub fn set_employee_id<L>(
        &mut self,
        employee_id: EmployeeId,
        lookup: &L,
    ) -> Result<(), ValidationError>
    where
        L: EmployeeLookup + ?Sized,
    {
        self.employee_id = validate_employee_id(employee_id, lookup)?;
        Ok(())
    }

    pub(crate) fn set_id(&mut self, id: Option<ReviewId>) {
        self.id = id;
    }

    /// Overwrite all data fields with freshly read, already validated values.
    pub(crate) fn reconcile(&mut self, year: i64, summary: String, employee_id: EmployeeId) {
        self.year = year;
        self.summary = summary;
        self.employee_id = employee_id;
    }
}

impl fmt::Display for Review {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "<Review {}: ", id)?,
            None => f.write_str("<Review None: ")?,
        }
        write!(
            f,
            "{}, {}, Employee: {}>",
            self.year, self.summary, self.employee_id
        )
    }
}

pub fn validate_year(year: i64) -> Result<i64, ValidationError> {
    if year >= MIN_REVIEW_YEAR {
        Ok(year)
    } else {
        Err(ValidationError::invalid(
            ReviewField::Year,
            format!("must be an integer >= {}, got {}", MIN_REVIEW_YEAR, year),
        ))
    }
}

pub fn validate_summary(summary: impl Into<String>) -> Result<String, ValidationError> {
    let summary = summary.into();
    if summary.is_empty() {
        return Err(ValidationError::invalid(
            ReviewField::Summary,
            "must be a non-empty string",
        ));
    }
    Ok(summary)
}

pub fn validate_employee_id<L>(
    employee_id: EmployeeId,
    lookup: &L,
) -> Result<EmployeeId, ValidationError>
where
    L: EmployeeLookup + ?Sized,
{
    if lookup.employee_exists(employee_id)? {
        Ok(employee_id)
    } else {
        Err(ValidationError::invalid(
            ReviewField::EmployeeId,
            format!("no employee with id {}", employee_id),
        ))
    }
}
