//! Opening the lesson store.
//!
//! # Invariants
//! - Migrations run, and the `lessons` table is verified, before a
//!   connection is handed out.
//! - Every open logs one `store_open` event carrying mode and schema version.

use super::migrations::{apply_migrations, current_user_version};
use super::{DbError, DbResult};
use crate::config::StoreConfig;
use log::{error, info};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Where a lesson store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    File(PathBuf),
    Memory,
}

impl StoreTarget {
    fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

impl From<&StoreConfig> for StoreTarget {
    fn from(config: &StoreConfig) -> Self {
        match &config.path {
            Some(path) => Self::File(path.clone()),
            None => Self::Memory,
        }
    }
}

/// Opens the store described by `config`.
pub fn open_store(config: &StoreConfig) -> DbResult<Connection> {
    open_target(&StoreTarget::from(config), config.busy_timeout())
}

/// Opens a file store with default settings.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let target = StoreTarget::File(path.as_ref().to_path_buf());
    open_target(&target, StoreConfig::default().busy_timeout())
}

/// Opens a private in-memory store, mainly for tests and previews.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_target(&StoreTarget::Memory, StoreConfig::default().busy_timeout())
}

fn open_target(target: &StoreTarget, busy_timeout: Duration) -> DbResult<Connection> {
    let started_at = Instant::now();
    let result = connect(target).and_then(|mut conn| {
        let version = prepare_schema(&mut conn, busy_timeout)?;
        Ok((conn, version))
    });
    match result {
        Ok((conn, version)) => {
            info!(
                "event=store_open module=db status=ok mode={} schema_version={} duration_ms={}",
                target.mode(),
                version,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=store_open module=db status=error mode={} duration_ms={} error={}",
                target.mode(),
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn connect(target: &StoreTarget) -> DbResult<Connection> {
    match target {
        StoreTarget::Memory => Ok(Connection::open_in_memory()?),
        StoreTarget::File(path) => {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|source| DbError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            Ok(Connection::open(path)?)
        }
    }
}

/// Applies pragmas and migrations; returns the resulting schema version.
fn prepare_schema(conn: &mut Connection, busy_timeout: Duration) -> DbResult<u32> {
    conn.busy_timeout(busy_timeout)?;
    apply_migrations(conn)?;
    let version = current_user_version(conn)?;
    let has_lessons = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'lessons');",
        [],
        |row| row.get::<_, bool>(0),
    )?;
    if !has_lessons {
        return Err(DbError::MissingLessonsTable {
            schema_version: version,
        });
    }
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::{open_store, StoreTarget};
    use crate::config::StoreConfig;
    use std::path::PathBuf;

    #[test]
    fn store_target_follows_configured_path() {
        let memory = StoreConfig::default();
        assert_eq!(StoreTarget::from(&memory), StoreTarget::Memory);

        let file = StoreConfig {
            path: Some(PathBuf::from("/var/lib/lessonkit/lessons.db")),
            ..StoreConfig::default()
        };
        assert_eq!(
            StoreTarget::from(&file),
            StoreTarget::File(PathBuf::from("/var/lib/lessonkit/lessons.db"))
        );
    }

    #[test]
    fn file_store_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("deeper").join("lessons.db");
        let config = StoreConfig {
            path: Some(path.clone()),
            busy_timeout_ms: 250,
        };

        open_store(&config).expect("store should open");
        assert!(path.exists());
    }
}
