//! Domain types for review records.
//! Defines the review record, its validation rules and the employee lookup port.

pub mod employee;
pub mod error;
pub mod review;

pub use employee::*;
pub use error::*;
pub use review::*;
