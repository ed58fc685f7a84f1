//! Domain records for the school roster.
//!
//! # Responsibility
//! - Define teacher/assistant/student records and their categorical fields.
//! - Own input parsing and categorical normalization (never the store).
//!
//! # Invariants
//! - Records map one-to-one onto rows; there are no cross-record links.
//! - Teachers and assistants hold an `Employee` by composition.

pub mod category;
pub mod person;
