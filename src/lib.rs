use std::{
    io::Write,
    time::Duration,
};

pub mod cli;
pub mod control;
pub mod daemon;
pub mod database;
pub mod domain;
pub mod library;
pub mod player;
pub mod queue;

pub use database::Database;

/// Interval of the daemon's position display tick. The tick also bounds
/// how long the dispatch loop sleeps when no events are pending.
pub const TICK_RATE: Duration = Duration::from_millis(500);

/// Format a duration as `m:ss` for queue and position display.
pub fn readable_duration(duration: Duration) -> String {
    let mut secs = duration.as_secs();
    let mins = secs / 60;
    secs %= 60;
    format!("{mins}:{secs:02}")
}

/// Rewrite the current terminal line in place. Used by the position tick
/// so the elapsed/duration readout does not scroll the queue away.
pub fn overwrite_line(message: &str) {
    let mut stdout = std::io::stdout();
    let _ = write!(stdout, "\r\x1b[2K{message}");
    let _ = stdout.flush();
}
