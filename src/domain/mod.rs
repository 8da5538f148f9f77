mod track;

pub use track::{TrackMeta, TrackTags};
