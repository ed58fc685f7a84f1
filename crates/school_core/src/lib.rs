//! Core domain logic for the school records manager.
//! This crate owns the data model, storage gateway and record repository.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{app_root, default_db_path, StoreConfig, DEFAULT_DB_FILE_NAME};
pub use db::{open_embedded_with_recovery, BackendKind, Database, DbError, DbResult, DbValue};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::category::{Category, Department, Speciality, Subject};
pub use model::person::{
    Assistant, AssistantDraft, Employee, Person, PersonDraft, PersonKind, Student, StudentDraft,
    Teacher, TeacherDraft, ValidationError,
};
pub use repo::school_repo::{NormalizeReport, SchoolRepository, StoreSchoolRepository};
pub use repo::stats::{CategoryAverage, CategoryCount};
pub use repo::{RepoError, RepoResult};
pub use service::charts::{ChartKind, ChartPayload};
pub use service::school_service::{
    ActionOutcome, SchoolService, SeedData, Snapshot, SortMode, StartupReport,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
