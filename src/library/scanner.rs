use super::LEGAL_EXTENSION;
use crate::{domain::TrackTags, Database};
use anyhow::{Context, Result};
use lofty::{
    file::{AudioFile, TaggedFileExt},
    probe::Probe,
    tag::{Accessor, ItemKey, Tag},
};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Walk the given directories, read tags from every recognized audio
/// file, and upsert the results into the catalog. Returns
/// `(indexed, skipped)` counts.
pub fn index_dirs(db: &mut Database, dirs: &[PathBuf]) -> Result<(usize, usize)> {
    let mut files = Vec::new();
    for dir in dirs {
        info!("scanning {}", dir.display());
        files.extend(collect_valid_files(dir));
    }

    let total = files.len();
    let tracks: Vec<TrackTags> = files
        .into_par_iter()
        .filter_map(|path| match read_tags(&path) {
            Ok(tags) => Some(tags),
            Err(e) => {
                warn!("skipping {}: {e}", path.display());
                None
            }
        })
        .collect();

    let indexed = tracks.len();
    for track in &tracks {
        db.insert_track(track)?;
    }

    Ok((indexed, total - indexed))
}

fn collect_valid_files(dir: impl AsRef<Path>) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| LEGAL_EXTENSION.contains(ext.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .filter_map(|entry| entry.path().canonicalize().ok())
        .collect()
}

fn read_tags(path: &Path) -> Result<TrackTags> {
    let tagged = Probe::open(path)?.read()?;

    let mut tags = TrackTags {
        path: path.to_string_lossy().into_owned(),
        duration: tagged.properties().duration(),
        ..Default::default()
    };

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        tags.title = tag.title().unwrap_or_default().into_owned();
        tags.artist = tag.artist().unwrap_or_default().into_owned();
        tags.album = tag.album().unwrap_or_default().into_owned();
        tags.genre = tag.genre().unwrap_or_default().into_owned();
        tags.comment = tag.comment().unwrap_or_default().into_owned();
        tags.date = tag.year().map(|y| y.to_string()).unwrap_or_default();
        tags.track_no = tag.track();
        tags.disc_no = tag.disk();
        tags.album_artist = item_string(tag, &ItemKey::AlbumArtist);
        tags.composer = item_string(tag, &ItemKey::Composer);
    }

    if tags.title.is_empty() {
        tags.title = path
            .file_stem()
            .context("file has no stem")?
            .to_string_lossy()
            .into_owned();
    }

    // Fall back through related credits so search and display never show
    // a blank artist when any of them is tagged.
    if tags.artist.is_empty() {
        for candidate in [&tags.album_artist, &tags.composer] {
            if !candidate.is_empty() {
                tags.artist = candidate.clone();
                break;
            }
        }
    }

    Ok(tags)
}

fn item_string(tag: &Tag, key: &ItemKey) -> String {
    tag.get_string(key).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_audio_extensions_are_collected() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.mp3", "b.FLAC", "c.txt", "d", "e.oga"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/f.wav"), b"x").unwrap();

        let mut names: Vec<String> = collect_valid_files(dir.path())
            .into_iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        names.sort();

        assert_eq!(names, vec!["a.mp3", "b.FLAC", "e.oga", "f.wav"]);
    }
}
