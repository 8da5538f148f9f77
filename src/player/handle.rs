use super::{
    core::PlayerCore, PlaybackState, PlaybackStatus, PlayerCommand, PlayerEvent, RodioBackend,
};
use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    thread::{self, JoinHandle},
    time::Duration,
};
use tracing::error;

/// Daemon-side handle to the player worker. Commands go out over one
/// channel, pipeline events come back over another, and the worker keeps
/// a small shared status cell current for position/state reads.
pub struct PlayerHandle {
    commands: Sender<PlayerCommand>,
    events: Receiver<PlayerEvent>,
    status: Arc<Mutex<PlaybackStatus>>,
    _worker: JoinHandle<()>,
}

impl PlayerHandle {
    pub fn spawn() -> Self {
        let (cmd_tx, cmd_rx) = unbounded();
        let (ev_tx, ev_rx) = unbounded();
        let status = Arc::new(Mutex::new(PlaybackStatus::default()));
        let status_clone = Arc::clone(&status);

        // The audio stream is not Send, so the backend is built on the
        // worker thread it will live on.
        let worker = thread::spawn(move || {
            let backend = match RodioBackend::new() {
                Ok(backend) => backend,
                Err(e) => {
                    error!("could not open an audio output stream: {e}");
                    let _ = ev_tx.send(PlayerEvent::Error(e.to_string()));
                    return;
                }
            };
            PlayerCore::new(backend, cmd_rx, ev_tx, status_clone).run();
        });

        PlayerHandle {
            commands: cmd_tx,
            events: ev_rx,
            status,
            _worker: worker,
        }
    }

    pub fn events(&self) -> &Receiver<PlayerEvent> {
        &self.events
    }

    pub fn play(&self, path: PathBuf) -> Result<()> {
        self.commands.send(PlayerCommand::Play(path))?;
        Ok(())
    }

    pub fn toggle_playback(&self) -> Result<()> {
        self.commands.send(PlayerCommand::TogglePlayback)?;
        Ok(())
    }

    pub fn stop(&self) -> Result<()> {
        self.commands.send(PlayerCommand::Stop)?;
        Ok(())
    }

    pub fn state(&self) -> PlaybackState {
        self.status.lock().expect("player status lock poisoned").state
    }

    pub fn elapsed(&self) -> Duration {
        self.status
            .lock()
            .expect("player status lock poisoned")
            .elapsed
    }
}
