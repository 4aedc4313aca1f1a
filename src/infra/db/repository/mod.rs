//! Repository implementations for data access in review records.
//!
//! Provides the review unit of work and the SQLite-backed employee lookup.

mod employee;
mod review;

pub use employee::SqliteEmployeeLookup;
pub use review::{ReviewRepository, ReviewRow};

use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type DbConn = Arc<Mutex<Connection>>;

/// Acquire the shared connection. A poisoned lock still guards a usable
/// connection since every statement commits on its own.
pub(super) fn lock(conn: &DbConn) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}
