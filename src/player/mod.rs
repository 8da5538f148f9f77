mod backend_rodio;
mod core;
mod handle;

pub use backend_rodio::RodioBackend;
pub use handle::PlayerHandle;

use std::{path::PathBuf, time::Duration};

/// How often the worker polls the backend for command drain, track-end
/// detection, and position updates.
const POLL_RATE: Duration = Duration::from_millis(33);

pub enum PlayerCommand {
    Play(PathBuf),
    TogglePlayback,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The loaded track ran to its natural end.
    TrackEnded,
    /// The backend faulted; the daemon shuts down on this.
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    /// A track is loaded but playback has not started yet.
    Ready,
    Playing,
    Paused,
}

/// Snapshot the worker keeps current and the daemon reads on each tick.
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub elapsed: Duration,
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        PlaybackStatus {
            state: PlaybackState::Stopped,
            elapsed: Duration::default(),
        }
    }
}
