use super::Daemon;
use crate::control;

const DISPLAY_BEFORE_CURRENT: usize = 5;
const DISPLAY_AFTER_CURRENT: usize = 5;

impl Daemon {
    /// Plain-text queue window: recent history, the current track, and
    /// the pending lookahead.
    pub(super) fn display_queue(&self) {
        let Ok(current_id) = self.queue.current() else {
            return;
        };

        println!();
        for id in self.queue.history(DISPLAY_BEFORE_CURRENT) {
            self.print_entry(id, false);
        }
        self.print_entry(current_id, true);
        for id in self.queue.pending(DISPLAY_AFTER_CURRENT) {
            self.print_entry(id, false);
        }
        println!();

        self.write_now_playing_file();
    }

    fn print_entry(&self, id: i64, current: bool) {
        let marker = if current { '>' } else { ' ' };
        match self.db.get_track(id) {
            Ok(Some(track)) => {
                println!(" {marker} {}. {}", track.id, track.title);
                println!(
                    " {marker}    by {} from {} [{}]",
                    track.artist,
                    track.album,
                    track.duration_str(),
                );
            }
            _ => println!(" {marker} {id}. (not in catalog)"),
        }
    }

    /// Small key/value file next to the socket so desktop integrations
    /// can read what is playing. Failures here never matter.
    fn write_now_playing_file(&self) {
        let Some(meta) = &self.now_playing else {
            return;
        };

        let path = control::now_playing_path();
        let body = format!(
            "Id: {}\nTitle: {}\nArtist: {}\nAlbum: {}\n",
            meta.id, meta.title, meta.artist, meta.album,
        );
        let _ = std::fs::write(path, body);
    }
}
