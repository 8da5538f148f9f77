pub const CREATE_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tracks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        artist TEXT NOT NULL DEFAULT '',
        album TEXT NOT NULL DEFAULT '',
        album_artist TEXT NOT NULL DEFAULT '',
        composer TEXT NOT NULL DEFAULT '',
        genre TEXT NOT NULL DEFAULT '',
        comment TEXT NOT NULL DEFAULT '',
        date TEXT NOT NULL DEFAULT '',
        track_no INTEGER,
        disc_no INTEGER,
        duration REAL NOT NULL DEFAULT 0,
        path TEXT NOT NULL UNIQUE
    );

    CREATE VIRTUAL TABLE IF NOT EXISTS tracks_fts
        USING fts5(body, content='', contentless_delete=1);

    CREATE TABLE IF NOT EXISTS search_save (
        counter INTEGER PRIMARY KEY AUTOINCREMENT,
        track_id INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS counters (
        track_id INTEGER PRIMARY KEY,
        listened INTEGER NOT NULL DEFAULT 0,
        queued INTEGER NOT NULL DEFAULT 0
    );
";

pub const INSERT_TRACK: &str = "
    INSERT INTO tracks (
        title, artist, album, album_artist, composer, genre,
        comment, date, track_no, disc_no, duration, path
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
    ON CONFLICT(path) DO UPDATE SET
        title = excluded.title,
        artist = excluded.artist,
        album = excluded.album,
        album_artist = excluded.album_artist,
        composer = excluded.composer,
        genre = excluded.genre,
        comment = excluded.comment,
        date = excluded.date,
        track_no = excluded.track_no,
        disc_no = excluded.disc_no,
        duration = excluded.duration
";

pub const GET_TRACK_ID_BY_PATH: &str = "
    SELECT id FROM tracks WHERE path = ?
";

pub const DELETE_FTS_ROW: &str = "
    DELETE FROM tracks_fts WHERE rowid = ?
";

pub const INSERT_FTS_ROW: &str = "
    INSERT INTO tracks_fts (rowid, body) VALUES (?1, ?2)
";

pub const GET_TRACK: &str = "
    SELECT id, title, artist, album, duration FROM tracks
    WHERE id = ?
";

pub const GET_PATH: &str = "
    SELECT path FROM tracks
    WHERE id = ?
";

pub const COUNT_TRACKS: &str = "
    SELECT COUNT(*) FROM tracks
";

pub const GET_TRACK_AT_OFFSET: &str = "
    SELECT id FROM tracks
    ORDER BY id
    LIMIT 1 OFFSET ?
";

pub const SEARCH_FTS: &str = "
    SELECT rowid FROM tracks_fts
    WHERE tracks_fts MATCH ?
    ORDER BY rank
";

pub const CLEAR_SEARCH_SAVE: &str = "
    DELETE FROM search_save
";

pub const INSERT_SEARCH_SAVE: &str = "
    INSERT INTO search_save (track_id) VALUES (?)
";

pub const GET_SEARCH_SAVE: &str = "
    SELECT track_id FROM search_save
    ORDER BY counter
";

pub const BUMP_LISTENED: &str = "
    INSERT INTO counters (track_id, listened, queued) VALUES (?, 1, 0)
    ON CONFLICT(track_id) DO UPDATE SET listened = listened + 1
";

pub const BUMP_QUEUED: &str = "
    INSERT INTO counters (track_id, listened, queued) VALUES (?, 0, 1)
    ON CONFLICT(track_id) DO UPDATE SET queued = queued + 1
";

pub const GET_COUNTERS: &str = "
    SELECT listened, queued FROM counters
    WHERE track_id = ?
";
