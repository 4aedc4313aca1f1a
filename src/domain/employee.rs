/// Identifier of an employee row.
pub type EmployeeId = i64;

/// Existence check for employees, used to validate `employee_id` on assignment.
///
/// Implemented by `infra::db::SqliteEmployeeLookup` and by any closure
/// `Fn(EmployeeId) -> anyhow::Result<bool>`.
pub trait EmployeeLookup {
    fn employee_exists(&self, id: EmployeeId) -> anyhow::Result<bool>;
}

impl<F> EmployeeLookup for F
where
    F: Fn(EmployeeId) -> anyhow::Result<bool>,
{
    fn employee_exists(&self, id: EmployeeId) -> anyhow::Result<bool> {
        self(id)
    }
}
