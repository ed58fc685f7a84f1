//! Best-effort startup recovery for an unreadable embedded store.
//!
//! # Responsibility
//! - Probe a freshly opened store with a no-op read.
//! - On failure, move the file (and WAL sidecars) aside and retry once.
//!
//! # Invariants
//! - At most one retry; the second failure is returned unchanged.
//! - Nothing is deleted, only renamed to `<stem>.corrupt.bak`.

use super::{Database, DbError, DbResult};
use log::{error, info, warn};
use std::path::{Path, PathBuf};

/// Result of [`open_embedded_with_recovery`].
#[derive(Debug)]
pub struct RecoveredDatabase {
    pub database: Database,
    /// Where the unreadable file was moved, when recovery happened.
    pub quarantined: Option<PathBuf>,
}

/// Opens the embedded store, quarantining an unreadable file once.
pub fn open_embedded_with_recovery(path: impl AsRef<Path>) -> DbResult<RecoveredDatabase> {
    let path = path.as_ref();
    let first_error = match open_and_probe(path) {
        Ok(database) => {
            return Ok(RecoveredDatabase {
                database,
                quarantined: None,
            })
        }
        Err(err) => err,
    };

    // A newer schema is readable, just not by this build; leave it in place.
    if !path.exists() || matches!(first_error, DbError::UnsupportedSchemaVersion { .. }) {
        return Err(first_error);
    }

    warn!(
        "event=db_recovery module=db status=start path={} error={}",
        path.display(),
        first_error
    );
    let backup = quarantine_path(path);
    move_aside(path, &backup)?;
    for suffix in ["-wal", "-shm"] {
        let sidecar = with_suffix(path, suffix);
        if sidecar.exists() {
            if let Err(err) = move_aside(&sidecar, &with_suffix(&backup, suffix)) {
                warn!("event=db_recovery module=db status=warn sidecar_error={err}");
            }
        }
    }

    match open_and_probe(path) {
        Ok(database) => {
            info!(
                "event=db_recovery module=db status=ok backup={}",
                backup.display()
            );
            Ok(RecoveredDatabase {
                database,
                quarantined: Some(backup),
            })
        }
        Err(err) => {
            error!("event=db_recovery module=db status=error error={err}");
            Err(err)
        }
    }
}

/// Returns `<dir>/<stem>.corrupt.bak` for `path`.
pub fn quarantine_path(path: &Path) -> PathBuf {
    path.with_extension("corrupt.bak")
}

fn open_and_probe(path: &Path) -> DbResult<Database> {
    let database = Database::open_embedded(path)?;
    database.scalar("SELECT 1", &[])?;
    Ok(database)
}

fn move_aside(from: &Path, to: &Path) -> DbResult<()> {
    std::fs::rename(from, to).map_err(|source| DbError::Io {
        path: from.to_path_buf(),
        source,
    })
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::{quarantine_path, with_suffix};
    use std::path::Path;

    #[test]
    fn quarantine_path_replaces_extension() {
        assert_eq!(
            quarantine_path(Path::new("/data/school.db")),
            Path::new("/data/school.corrupt.bak")
        );
    }

    #[test]
    fn sidecar_suffix_is_appended() {
        assert_eq!(
            with_suffix(Path::new("/data/school.db"), "-wal"),
            Path::new("/data/school.db-wal")
        );
    }
}
