mod counters;
mod queries;
mod tracks;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Catalog of indexed tracks. Lives under the platform config directory
/// (which honors the XDG environment), one database per user.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open() -> Result<Self> {
        let dir = Self::config_dir()?;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("could not create {}", dir.display()))?;
        Self::open_at(dir.join("catalog.db"))
    }

    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).with_context(|| {
            format!("could not open catalog at {}", path.as_ref().display())
        })?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.execute_batch(queries::CREATE_SCHEMA)?;

        Ok(Database { conn })
    }

    fn config_dir() -> Result<PathBuf> {
        let base = dirs::config_dir().context("could not resolve a config directory")?;
        Ok(base.join("troubadour"))
    }
}
