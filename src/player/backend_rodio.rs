use anyhow::Result;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use std::{path::Path, time::Duration};

/// Seam between the player worker and the actual audio pipeline. Tests
/// drive the worker with a scripted implementation.
pub trait AudioBackend {
    fn play(&mut self, path: &Path) -> Result<()>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    fn position(&self) -> Duration;
    /// True once the appended source has drained completely.
    fn is_finished(&self) -> bool;
}

pub struct RodioBackend {
    sink: Sink,
    _stream: OutputStream,
}

impl RodioBackend {
    pub fn new() -> Result<Self> {
        let stream = OutputStreamBuilder::open_default_stream()?;
        let sink = Sink::connect_new(stream.mixer());
        Ok(RodioBackend {
            sink,
            _stream: stream,
        })
    }
}

impl AudioBackend for RodioBackend {
    fn play(&mut self, path: &Path) -> Result<()> {
        let file = std::fs::File::open(path)?;
        let source = Decoder::try_from(file)?;

        self.sink.clear();
        self.sink.append(source);
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn resume(&mut self) {
        self.sink.play();
    }

    fn stop(&mut self) {
        self.sink.stop();
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }
}
