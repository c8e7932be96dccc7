//! Audio output abstraction and the rodio-backed implementation.
//!
//! The reader never touches the audio device directly: it commands an
//! [`AudioOutput`] and resynchronizes its state from the events `poll`
//! returns. Commands take effect on the device immediately, but the reader
//! only learns about them through events, which keeps the state machine
//! honest about what the device is actually doing.

use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Playback notifications, drained in delivery order via [`AudioOutput::poll`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioEvent {
    /// The playhead moved; reported many times per second while playing.
    PositionChanged(Duration),
    /// The source's total length became known.
    DurationKnown(Duration),
    /// Audible output began.
    Started,
    /// Audible output stopped short of the end.
    Paused,
    /// The source played to its end.
    Finished,
}

/// Capability interface over one exclusively-owned playback resource.
///
/// `load` swaps the source: it stops playback, discards any queued events
/// from the previous source, and invalidates position and duration.
pub trait AudioOutput {
    fn load(&mut self, source: &Path) -> Result<()>;
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, position: Duration);
    fn set_volume(&mut self, volume: f32);
    fn set_speed(&mut self, speed: f32);
    fn poll(&mut self) -> Vec<AudioEvent>;
}

/// Production output: one `rodio` sink per loaded source.
pub struct RodioOutput {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
    pending: Vec<AudioEvent>,
    playing: bool,
    volume: f32,
    speed: f32,
}

impl RodioOutput {
    pub fn new() -> Result<Self> {
        let (_stream, handle) = OutputStream::try_default().context("Opening audio output")?;
        Ok(Self {
            _stream,
            handle,
            sink: None,
            pending: Vec::new(),
            playing: false,
            volume: 1.0,
            speed: 1.0,
        })
    }
}

impl AudioOutput for RodioOutput {
    fn load(&mut self, source: &Path) -> Result<()> {
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        self.pending.clear();
        self.playing = false;

        let file = File::open(source)
            .with_context(|| format!("Failed to open audio source {}", source.display()))?;
        let decoder = Decoder::new(BufReader::new(file))
            .with_context(|| format!("Failed to decode {}", source.display()))?;
        let total = decoder.total_duration();

        let sink = Sink::try_new(&self.handle).context("Creating sink")?;
        sink.pause();
        sink.set_volume(self.volume);
        sink.set_speed(self.speed);
        sink.append(decoder);

        match total {
            Some(total) => self.pending.push(AudioEvent::DurationKnown(total)),
            None => warn!(path = %source.display(), "Source reports no total duration"),
        }
        debug!(path = %source.display(), "Loaded audio source");
        self.sink = Some(sink);
        Ok(())
    }

    fn play(&mut self) {
        if let Some(sink) = &self.sink {
            if sink.empty() {
                debug!("Play requested with no queued audio");
                return;
            }
            sink.play();
            self.playing = true;
            self.pending.push(AudioEvent::Started);
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
            if self.playing {
                self.playing = false;
                self.pending.push(AudioEvent::Paused);
            }
        }
    }

    fn seek(&mut self, position: Duration) {
        if let Some(sink) = &self.sink {
            match sink.try_seek(position) {
                Ok(()) => self
                    .pending
                    .push(AudioEvent::PositionChanged(sink.get_pos())),
                Err(err) => warn!("Seek to {position:?} failed: {err}"),
            }
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(sink) = &self.sink {
            sink.set_volume(volume);
        }
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
        if let Some(sink) = &self.sink {
            sink.set_speed(speed);
        }
    }

    fn poll(&mut self) -> Vec<AudioEvent> {
        let mut events = std::mem::take(&mut self.pending);
        if let Some(sink) = &self.sink {
            if self.playing {
                if sink.empty() {
                    self.playing = false;
                    events.push(AudioEvent::Finished);
                } else {
                    events.push(AudioEvent::PositionChanged(sink.get_pos()));
                }
            }
        }
        events
    }
}

/// Fallback used when no audio device can be opened: every command is a
/// no-op and no events are ever produced, so the reader stays usable with a
/// silent transport (duration unknown, never playing).
pub struct NullOutput;

impl AudioOutput for NullOutput {
    fn load(&mut self, source: &Path) -> Result<()> {
        debug!(path = %source.display(), "Null output ignoring source");
        Ok(())
    }

    fn play(&mut self) {}

    fn pause(&mut self) {}

    fn seek(&mut self, _position: Duration) {}

    fn set_volume(&mut self, _volume: f32) {}

    fn set_speed(&mut self, _speed: f32) {}

    fn poll(&mut self) -> Vec<AudioEvent> {
        Vec::new()
    }
}
