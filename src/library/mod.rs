mod scanner;

pub use scanner::index_dirs;

static LEGAL_EXTENSION: std::sync::LazyLock<std::collections::HashSet<&'static str>> =
    std::sync::LazyLock::new(|| {
        std::collections::HashSet::from([
            "mp3", "m4a", "m4b", "aac", "flac", "ogg", "oga", "wav", "aif", "aiff",
        ])
    });
