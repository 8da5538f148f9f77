use super::{
    backend_rodio::AudioBackend, PlaybackState, PlaybackStatus, PlayerCommand, PlayerEvent,
    POLL_RATE,
};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    thread,
};
use tracing::warn;

/// Worker-side half of the player: drains the command channel, watches
/// the backend for end-of-stream, and keeps the shared status current.
pub(super) struct PlayerCore<B: AudioBackend> {
    backend: B,
    commands: Receiver<PlayerCommand>,
    events: Sender<PlayerEvent>,
    status: Arc<Mutex<PlaybackStatus>>,
    current: Option<PathBuf>,
}

impl<B: AudioBackend> PlayerCore<B> {
    pub(super) fn new(
        backend: B,
        commands: Receiver<PlayerCommand>,
        events: Sender<PlayerEvent>,
        status: Arc<Mutex<PlaybackStatus>>,
    ) -> Self {
        PlayerCore {
            backend,
            commands,
            events,
            status,
            current: None,
        }
    }

    pub(super) fn run(&mut self) {
        loop {
            if !self.process_commands() {
                return;
            }
            self.check_track_end();
            self.update_position();
            thread::sleep(POLL_RATE);
        }
    }

    /// Returns false once the daemon side has hung up.
    pub(super) fn process_commands(&mut self) -> bool {
        loop {
            match self.commands.try_recv() {
                Ok(PlayerCommand::Play(path)) => self.play_track(path),
                Ok(PlayerCommand::TogglePlayback) => self.toggle_playback(),
                Ok(PlayerCommand::Stop) => self.stop(),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn play_track(&mut self, path: PathBuf) {
        self.set_state(PlaybackState::Ready);

        if let Err(e) = self.backend.play(&path) {
            warn!("could not start {}: {e}", path.display());
            self.current = None;
            self.set_state(PlaybackState::Stopped);
            self.emit(PlayerEvent::Error(e.to_string()));
            return;
        }

        self.current = Some(path);
        let mut status = self.lock_status();
        status.state = PlaybackState::Playing;
        status.elapsed = Default::default();
    }

    fn toggle_playback(&mut self) {
        let state = self.lock_status().state;
        match state {
            PlaybackState::Playing => {
                self.backend.pause();
                self.set_state(PlaybackState::Paused);
            }
            PlaybackState::Paused => {
                self.backend.resume();
                self.set_state(PlaybackState::Playing);
            }
            // Nothing loaded: the daemon handles this by loading the
            // current queue track instead of sending a toggle.
            PlaybackState::Stopped | PlaybackState::Ready => {}
        }
    }

    fn stop(&mut self) {
        self.backend.stop();
        self.current = None;
        let mut status = self.lock_status();
        status.state = PlaybackState::Stopped;
        status.elapsed = Default::default();
    }

    /// Checking `current` ensures the end event fires exactly once.
    pub(super) fn check_track_end(&mut self) {
        if self.current.is_some()
            && self.lock_status().state == PlaybackState::Playing
            && self.backend.is_finished()
        {
            self.current = None;
            self.set_state(PlaybackState::Stopped);
            self.emit(PlayerEvent::TrackEnded);
        }
    }

    fn update_position(&mut self) {
        let mut status = self.lock_status();
        if status.state == PlaybackState::Playing {
            status.elapsed = self.backend.position();
        }
    }

    fn set_state(&self, state: PlaybackState) {
        self.lock_status().state = state;
    }

    fn lock_status(&self) -> std::sync::MutexGuard<'_, PlaybackStatus> {
        self.status.lock().expect("player status lock poisoned")
    }

    fn emit(&self, event: PlayerEvent) {
        let _ = self.events.send(event);
    }
}
