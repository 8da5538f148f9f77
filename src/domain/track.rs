use crate::readable_duration;
use std::time::Duration;

/// Catalog view of one track, as pulled back out of the database.
#[derive(Debug, Clone)]
pub struct TrackMeta {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration: Duration,
}

impl TrackMeta {
    pub fn duration_str(&self) -> String {
        readable_duration(self.duration)
    }
}

/// Everything the scanner pulls out of a file's tags, plus its location.
/// The catalog row is written verbatim from this.
#[derive(Debug, Clone, Default)]
pub struct TrackTags {
    pub path: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub album_artist: String,
    pub composer: String,
    pub genre: String,
    pub comment: String,
    pub date: String,
    pub track_no: Option<u32>,
    pub disc_no: Option<u32>,
    pub duration: Duration,
}

impl TrackTags {
    /// Concatenated text fields, in a stable order, for the full-text
    /// search index.
    pub fn search_body(&self) -> String {
        [
            &self.title,
            &self.artist,
            &self.album,
            &self.album_artist,
            &self.composer,
            &self.genre,
            &self.comment,
            &self.date,
        ]
        .iter()
        .map(|s| s.as_str())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_body_skips_empty_fields() {
        let tags = TrackTags {
            title: "Song".into(),
            artist: "Band".into(),
            ..Default::default()
        };
        assert_eq!(tags.search_body(), "Song Band");
    }
}
