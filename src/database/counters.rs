use super::queries::{BUMP_LISTENED, BUMP_QUEUED, GET_COUNTERS};
use crate::Database;
use anyhow::Result;
use rusqlite::params;

/// Advisory per-track play bookkeeping: how often a track was loaded for
/// playback and how often it was explicitly queued. Callers treat
/// failures here as non-fatal.
impl Database {
    pub fn bump_listened(&mut self, track_id: i64) -> Result<()> {
        self.conn.execute(BUMP_LISTENED, params![track_id])?;
        Ok(())
    }

    pub fn bump_queued(&mut self, track_id: i64) -> Result<()> {
        self.conn.execute(BUMP_QUEUED, params![track_id])?;
        Ok(())
    }

    /// `(listened, queued)`, zeroes for never-touched tracks.
    pub fn counters(&self, track_id: i64) -> Result<(i64, i64)> {
        match self.conn.query_row(GET_COUNTERS, params![track_id], |row| {
            Ok((row.get(0)?, row.get(1)?))
        }) {
            Ok(pair) => Ok(pair),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok((0, 0)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::open_at(dir.path().join("catalog.db")).unwrap();

        assert_eq!(db.counters(5).unwrap(), (0, 0));

        db.bump_listened(5).unwrap();
        db.bump_listened(5).unwrap();
        db.bump_queued(5).unwrap();

        assert_eq!(db.counters(5).unwrap(), (2, 1));
        assert_eq!(db.counters(6).unwrap(), (0, 0));
    }
}
