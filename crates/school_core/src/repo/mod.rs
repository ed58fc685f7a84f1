//! Repository layer: typed records to rows and back.
//!
//! # Responsibility
//! - Define the data access contract used by the service layer.
//! - Keep SQL and row decoding inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate records before any statement runs.
//! - Store constraint failures surface as [`RepoError::Integrity`].
//! - Repository methods never call each other expecting a shared transaction.

use crate::db::DbError;
use crate::model::person::{PersonKind, ValidationError};
use thiserror::Error;

pub mod school_repo;
pub mod stats;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Duplicate identifier or other constraint rejected by the store.
    #[error("{0}")]
    Integrity(String),
    #[error("{kind} not found: {id}")]
    NotFound { kind: PersonKind, id: String },
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
    #[error(transparent)]
    Db(DbError),
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Integrity(message) => Self::Integrity(message),
            other => Self::Db(other),
        }
    }
}
