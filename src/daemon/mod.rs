mod display;

use crate::{
    control::{self, Message, Opcode, ServerSocket},
    domain::TrackMeta,
    overwrite_line,
    player::{PlaybackState, PlayerEvent, PlayerHandle},
    queue::TrackQueue,
    readable_duration, Database, TICK_RATE,
};
use anyhow::{bail, Result};
use crossbeam_channel::{select, unbounded, Receiver};
use std::{path::PathBuf, thread, time::Duration};
use tracing::{error, info, warn};

/// `prev` while more than this far into a playing track restarts it
/// instead of stepping back through history.
const PREV_RESTART_THRESHOLD: Duration = Duration::from_secs(5);

/// The server context: queue, catalog, and player handle, owned by the
/// dispatch loop and mutated only from it. One handler runs at a time,
/// so none of this state needs locking.
pub struct Daemon {
    db: Database,
    queue: TrackQueue,
    player: PlayerHandle,
    messages: Receiver<Message>,
    now_playing: Option<TrackMeta>,
    running: bool,
    // Held for its Drop: unlinks the socket path on shutdown.
    _socket: ServerSocket,
}

impl Daemon {
    /// Become the server for this user. Fails when another instance
    /// already holds the per-user socket address.
    pub fn start() -> Result<()> {
        if control::server_is_running() {
            bail!("a server is already running for this user");
        }

        let socket = ServerSocket::bind()?;
        let reader = socket.try_clone()?;
        let (msg_tx, msg_rx) = unbounded();

        // Reader thread: drain datagrams into the dispatch loop. Ends
        // when the socket or the loop goes away.
        thread::spawn(move || {
            loop {
                match ServerSocket::recv_message(&reader) {
                    Ok(Some(message)) => {
                        if msg_tx.send(message).is_err() {
                            return;
                        }
                    }
                    // Malformed datagram, already logged. Keep reading.
                    Ok(None) => {}
                    Err(e) => {
                        error!("control socket read failed: {e}");
                        return;
                    }
                }
            }
        });

        let mut daemon = Daemon {
            db: Database::open()?,
            queue: TrackQueue::new(),
            player: PlayerHandle::spawn(),
            messages: msg_rx,
            now_playing: None,
            running: true,
            _socket: socket,
        };
        daemon.event_loop()
    }

    /// The serialization point: every state mutation happens on this
    /// loop, one event at a time.
    fn event_loop(&mut self) -> Result<()> {
        info!("listening on {}", control::socket_path().display());

        while self.running {
            select! {
                recv(self.messages) -> message => match message {
                    Ok(message) => self.dispatch(message),
                    Err(_) => {
                        error!("control channel closed");
                        self.running = false;
                    }
                },

                recv(self.player.events()) -> event => match event {
                    Ok(event) => self.handle_player_event(event),
                    Err(_) => {
                        error!("player worker exited");
                        self.running = false;
                    }
                },

                default(TICK_RATE) => self.tick(),
            }
        }

        info!("shutting down");
        Ok(())
    }

    fn dispatch(&mut self, message: Message) {
        let result = match message.opcode {
            // Channel validation only; clients send this on connect.
            Opcode::Handshake => Ok(()),
            Opcode::PlayPause => self.play_pause(),
            Opcode::Stop => self.player.stop(),
            Opcode::Next => self.next(),
            Opcode::Prev => self.prev(),
            Opcode::Rewind => self.rewind(),
            Opcode::Add => self.add(message.argument),
        };

        if let Err(e) = result {
            warn!("{:?} failed: {e}", message.opcode);
        }
    }

    fn handle_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::TrackEnded => {
                if let Err(e) = self.next() {
                    error!("could not advance after end of stream: {e}");
                }
            }
            PlayerEvent::Error(e) => {
                error!("pipeline fault, shutting down: {e}");
                self.running = false;
            }
        }
    }

    fn tick(&mut self) {
        if self.player.state() != PlaybackState::Playing {
            return;
        }
        if let Some(meta) = &self.now_playing {
            overwrite_line(&format!(
                "  {} / {}  {}",
                readable_duration(self.player.elapsed()),
                meta.duration_str(),
                meta.title,
            ));
        }
    }
}

impl Daemon {
    fn play_pause(&mut self) -> Result<()> {
        match self.player.state() {
            PlaybackState::Playing | PlaybackState::Paused => self.player.toggle_playback(),
            // Nothing loaded: start on the current queue track instead.
            PlaybackState::Stopped | PlaybackState::Ready => self.play_current(),
        }
    }

    /// Load whatever the queue cursor points at, advancing first when it
    /// has never been set. Falls through to `next` if the current entry
    /// no longer resolves in the catalog.
    fn play_current(&mut self) -> Result<()> {
        if !self.queue.has_current() {
            return self.next();
        }

        let id = self.queue.current()?;
        if !self.load_track(id)? {
            return self.next();
        }
        Ok(())
    }

    /// Advance until a queued id resolves in the catalog. Entries that
    /// have drifted out of the catalog are skipped, not surfaced as
    /// playback errors. Terminates because stale explicit entries are
    /// finite and random picks come straight from the catalog.
    fn next(&mut self) -> Result<()> {
        loop {
            let id = {
                let db = &self.db;
                self.queue.advance(|| db.random_track())?
            };
            if self.load_track(id)? {
                return Ok(());
            }
        }
    }

    fn prev(&mut self) -> Result<()> {
        if self.player.state() == PlaybackState::Playing
            && self.player.elapsed() > PREV_RESTART_THRESHOLD
        {
            return self.rewind();
        }

        match self.queue.to_prev() {
            true => self.play_current(),
            false => {
                info!("no playback history");
                Ok(())
            }
        }
    }

    /// Replay the current track from its start; the queue cursor does
    /// not move.
    fn rewind(&mut self) -> Result<()> {
        if !self.queue.has_current() {
            return Ok(());
        }
        self.play_current()
    }

    fn add(&mut self, id: i64) -> Result<()> {
        match self.db.get_track(id)? {
            Some(meta) => {
                if let Err(e) = self.db.bump_queued(id) {
                    warn!("could not update queue counters: {e}");
                }
                println!(" + queued {} — {}", meta.title, meta.artist);
            }
            // Queue it anyway; next() will skip it if it never appears.
            None => warn!("track {id} is not in the catalog"),
        }

        self.queue.append(id);
        self.display_queue();
        Ok(())
    }

    /// Hand a track's location to the player. Returns false when the id
    /// is missing from the catalog (skip-and-log, never fatal).
    fn load_track(&mut self, id: i64) -> Result<bool> {
        let Some(meta) = self.db.get_track(id)? else {
            warn!("track {id} is no longer in the catalog, skipping");
            return Ok(false);
        };
        let Some(path) = self.db.get_path(id)? else {
            warn!("track {id} has no stored location, skipping");
            return Ok(false);
        };

        self.player.play(PathBuf::from(path))?;

        if let Err(e) = self.db.bump_listened(id) {
            warn!("could not update play counters: {e}");
        }

        info!("playing {} — {}", meta.title, meta.artist);
        self.now_playing = Some(meta);
        self.display_queue();
        Ok(true)
    }
}
