//! Store selection and default locations.
//!
//! # Responsibility
//! - Resolve the default embedded database path next to the executable.
//! - Turn a connection string or environment into an explicit [`StoreConfig`].
//!
//! # Invariants
//! - An empty connection string always selects the embedded store.

use std::path::{Path, PathBuf};

/// File name of the embedded store.
pub const DEFAULT_DB_FILE_NAME: &str = "school.db";
/// Overrides the embedded file location.
pub const DB_PATH_ENV: &str = "SCHOOL_DB_PATH";
/// Selects the network backend when set to a non-empty value.
pub const DATABASE_URL_ENV: &str = "SCHOOL_DATABASE_URL";

/// Which backend to open, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// Single-file SQLite store at `path`.
    Embedded { path: PathBuf },
    /// PostgreSQL connection string (`host=... user=...` or `postgres://...`).
    Network { connection_string: String },
}

impl StoreConfig {
    /// Embedded store at [`default_db_path`].
    pub fn embedded_default() -> Self {
        Self::Embedded {
            path: default_db_path(),
        }
    }

    pub fn embedded(path: impl Into<PathBuf>) -> Self {
        Self::Embedded { path: path.into() }
    }

    /// Maps the legacy "empty means local file" connection string.
    pub fn from_connection_string(connection_string: &str) -> Self {
        let trimmed = connection_string.trim();
        if trimmed.is_empty() {
            Self::embedded_default()
        } else {
            Self::Network {
                connection_string: trimmed.to_string(),
            }
        }
    }

    /// Resolves the store from `SCHOOL_DATABASE_URL` / `SCHOOL_DB_PATH`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(DATABASE_URL_ENV).filter(|url| !url.trim().is_empty()) {
            return Self::from_connection_string(&url);
        }
        match lookup(DB_PATH_ENV).filter(|path| !path.trim().is_empty()) {
            Some(path) => Self::embedded(path.trim()),
            None => Self::embedded_default(),
        }
    }

    /// Embedded file path, if this config selects the embedded store.
    pub fn embedded_path(&self) -> Option<&Path> {
        match self {
            Self::Embedded { path } => Some(path.as_path()),
            Self::Network { .. } => None,
        }
    }
}

/// Directory the application runs from.
///
/// Uses the executable's directory so a packaged build keeps its database
/// beside the binary; falls back to the working directory.
pub fn app_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_db_path() -> PathBuf {
    app_root().join(DEFAULT_DB_FILE_NAME)
}
