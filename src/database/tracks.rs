use super::queries::{
    CLEAR_SEARCH_SAVE, COUNT_TRACKS, DELETE_FTS_ROW, GET_PATH, GET_SEARCH_SAVE, GET_TRACK,
    GET_TRACK_AT_OFFSET, GET_TRACK_ID_BY_PATH, INSERT_FTS_ROW, INSERT_SEARCH_SAVE, INSERT_TRACK,
    SEARCH_FTS,
};
use crate::{
    domain::{TrackMeta, TrackTags},
    Database,
};
use anyhow::{anyhow, Result};
use rand::Rng;
use rusqlite::params;
use std::time::Duration;

impl Database {
    /// Insert or refresh one scanned track and its search-index row.
    /// Returns the catalog id.
    pub fn insert_track(&mut self, tags: &TrackTags) -> Result<i64> {
        let tx = self.conn.transaction()?;

        tx.execute(
            INSERT_TRACK,
            params![
                tags.title,
                tags.artist,
                tags.album,
                tags.album_artist,
                tags.composer,
                tags.genre,
                tags.comment,
                tags.date,
                tags.track_no,
                tags.disc_no,
                tags.duration.as_secs_f64(),
                tags.path,
            ],
        )?;

        // An upsert does not report a rowid for the update arm.
        let id: i64 = tx.query_row(GET_TRACK_ID_BY_PATH, params![tags.path], |row| row.get(0))?;

        tx.execute(DELETE_FTS_ROW, params![id])?;
        tx.execute(INSERT_FTS_ROW, params![id, tags.search_body()])?;

        tx.commit()?;
        Ok(id)
    }

    pub fn get_track(&self, id: i64) -> Result<Option<TrackMeta>> {
        match self.conn.query_row(GET_TRACK, params![id], |row| {
            Ok(TrackMeta {
                id: row.get(0)?,
                title: row.get(1)?,
                artist: row.get(2)?,
                album: row.get(3)?,
                duration: Duration::from_secs_f64(row.get(4)?),
            })
        }) {
            Ok(meta) => Ok(Some(meta)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Playable location of a track, or None when the id has drifted out
    /// of the catalog since it was queued.
    pub fn get_path(&self, id: i64) -> Result<Option<String>> {
        match self
            .conn
            .query_row(GET_PATH, params![id], |row| row.get::<_, String>(0))
        {
            Ok(path) => Ok(Some(path)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Uniformly random catalog id; errors when the catalog is empty.
    pub fn random_track(&self) -> Result<i64> {
        let count: i64 = self.conn.query_row(COUNT_TRACKS, [], |row| row.get(0))?;
        if count == 0 {
            return Err(anyhow!("the catalog is empty, index some music first"));
        }

        let offset = rand::rng().random_range(0..count);
        let id = self
            .conn
            .query_row(GET_TRACK_AT_OFFSET, params![offset], |row| row.get(0))?;
        Ok(id)
    }

    /// Full-text search over the tag fields. The hit list replaces the
    /// saved search results so a following `add all` can reuse it.
    pub fn search(&mut self, terms: &str) -> Result<Vec<TrackMeta>> {
        let ids: Vec<i64> = {
            let mut stmt = self.conn.prepare(SEARCH_FTS)?;
            let rows = stmt.query_map(params![terms], |row| row.get(0))?;
            rows.collect::<std::result::Result<_, _>>()?
        };

        let tx = self.conn.transaction()?;
        tx.execute(CLEAR_SEARCH_SAVE, [])?;
        {
            let mut stmt = tx.prepare(INSERT_SEARCH_SAVE)?;
            for id in &ids {
                stmt.execute(params![id])?;
            }
        }
        tx.commit()?;

        let mut hits = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(meta) = self.get_track(id)? {
                hits.push(meta);
            }
        }
        Ok(hits)
    }

    /// Ids of the most recent search, in rank order.
    pub fn saved_search_ids(&self) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(GET_SEARCH_SAVE)?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(title: &str, artist: &str, path: &str) -> TrackTags {
        TrackTags {
            path: path.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            album: "Test Album".to_string(),
            duration: Duration::from_secs(180),
            ..Default::default()
        }
    }

    fn open_test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(dir.path().join("catalog.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn insert_then_lookup() {
        let (_dir, mut db) = open_test_db();
        let id = db.insert_track(&tags("Aria", "Bach", "/m/aria.flac")).unwrap();

        let meta = db.get_track(id).unwrap().unwrap();
        assert_eq!(meta.title, "Aria");
        assert_eq!(meta.artist, "Bach");
        assert_eq!(meta.duration, Duration::from_secs(180));

        assert_eq!(db.get_path(id).unwrap().unwrap(), "/m/aria.flac");
        assert_eq!(db.get_path(id + 1000).unwrap(), None);
        assert!(db.get_track(id + 1000).unwrap().is_none());
    }

    #[test]
    fn reindexing_a_path_updates_in_place() {
        let (_dir, mut db) = open_test_db();
        let first = db.insert_track(&tags("Old", "X", "/m/a.flac")).unwrap();
        let second = db.insert_track(&tags("New", "X", "/m/a.flac")).unwrap();

        assert_eq!(first, second);
        assert_eq!(db.get_track(first).unwrap().unwrap().title, "New");
    }

    #[test]
    fn random_track_errors_on_empty_catalog() {
        let (_dir, db) = open_test_db();
        assert!(db.random_track().is_err());
    }

    #[test]
    fn random_track_returns_known_ids() {
        let (_dir, mut db) = open_test_db();
        let a = db.insert_track(&tags("A", "X", "/m/a.flac")).unwrap();
        let b = db.insert_track(&tags("B", "X", "/m/b.flac")).unwrap();

        for _ in 0..20 {
            let id = db.random_track().unwrap();
            assert!(id == a || id == b);
        }
    }

    #[test]
    fn search_matches_and_saves_results() {
        let (_dir, mut db) = open_test_db();
        let hit = db
            .insert_track(&tags("Goldberg Variations", "Bach", "/m/gold.flac"))
            .unwrap();
        db.insert_track(&tags("Unrelated", "Someone", "/m/other.flac"))
            .unwrap();

        let hits = db.search("goldberg").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, hit);
        assert_eq!(db.saved_search_ids().unwrap(), vec![hit]);

        // A new search replaces the saved list.
        let none = db.search("nomatch").unwrap();
        assert!(none.is_empty());
        assert!(db.saved_search_ids().unwrap().is_empty());
    }
}
