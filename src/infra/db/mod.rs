//! SQLite persistence (infrastructure).

pub mod database;
pub mod repository;

pub use database::Database;
pub use repository::{DbConn, ReviewRepository, ReviewRow, SqliteEmployeeLookup};
