//! The chapter playback state machine.
//!
//! [`ChapterPlayer`] owns the playback state and the audio output for one
//! mounted reader. User actions mutate state and command the output; the
//! output answers with events that are folded back in through
//! [`ChapterPlayer::apply_event`]. Play/pause is only ever flipped by an
//! event, never assumed when the command is issued.

use crate::audio::{AudioEvent, AudioOutput};
use crate::book::Chapter;
use anyhow::{Result, bail};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fixed transport skip step, in seconds.
pub const SKIP_STEP_SECS: f32 = 15.0;
/// Upper seek bound while the source's duration is still unknown.
pub const UNKNOWN_DURATION_SEEK_CAP_SECS: f32 = 100.0;
/// Playback-rate bounds.
pub const MIN_SPEED: f32 = 0.5;
pub const MAX_SPEED: f32 = 2.0;

/// Reader-owned playback state. Mutated only by [`ChapterPlayer`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub chapter_id: u32,
    pub is_playing: bool,
    pub position: Duration,
    /// `Duration::ZERO` means the current source's length is not yet known.
    pub duration: Duration,
    pub volume: f32,
    pub speed: f32,
}

pub struct ChapterPlayer {
    chapters: Vec<Chapter>,
    state: PlaybackState,
    epoch: u64,
    output: Box<dyn AudioOutput>,
}

impl ChapterPlayer {
    /// Mount a reader over a fixed chapter list. The first chapter is
    /// selected and its source loaded; a source that fails to load leaves
    /// the transport silent rather than failing the mount.
    pub fn new(chapters: Vec<Chapter>, mut output: Box<dyn AudioOutput>) -> Result<Self> {
        let Some(first) = chapters.first() else {
            bail!("A book needs at least one chapter");
        };
        if let Err(err) = output.load(&first.audio) {
            warn!(chapter = first.id, "Failed to load opening chapter audio: {err:#}");
        }
        let state = PlaybackState {
            chapter_id: first.id,
            is_playing: false,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            volume: 1.0,
            speed: 1.0,
        };
        info!(chapter = state.chapter_id, "Mounted chapter player");
        Ok(Self {
            chapters,
            state,
            epoch: 0,
            output,
        })
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn awaiting_duration(&self) -> bool {
        self.state.duration == Duration::ZERO
    }

    /// The selected chapter's metadata. The selection invariant guarantees
    /// the id is always present in the list.
    pub fn current_chapter(&self) -> &Chapter {
        self.chapters
            .iter()
            .find(|chapter| chapter.id == self.state.chapter_id)
            .unwrap_or(&self.chapters[0])
    }

    /// Request play or pause from the output. `is_playing` flips when the
    /// matching [`AudioEvent`] comes back, not here.
    pub fn toggle_play_pause(&mut self) {
        if self.state.is_playing {
            info!(chapter = self.state.chapter_id, "Pause requested");
            self.output.pause();
        } else {
            info!(chapter = self.state.chapter_id, "Play requested");
            self.output.play();
        }
    }

    /// Move the playhead by a signed offset, clamped to the known extent of
    /// the source. While the duration is unknown the extent is zero, so a
    /// skip cannot run ahead of unloaded audio.
    pub fn skip(&mut self, delta_secs: f32) {
        let cap = self.state.duration.as_secs_f32();
        let target = (self.state.position.as_secs_f32() + delta_secs).clamp(0.0, cap);
        let target = Duration::from_secs_f32(target);
        debug!(
            chapter = self.state.chapter_id,
            delta = delta_secs,
            to = ?target,
            "Skip"
        );
        self.output.seek(target);
        self.state.position = target;
    }

    /// Seek to an absolute position in seconds. While the duration is
    /// unknown the seek bar spans a fallback range, and targets are clamped
    /// to that same range.
    pub fn seek_to(&mut self, secs: f32) {
        let cap = if self.state.duration > Duration::ZERO {
            self.state.duration.as_secs_f32()
        } else {
            UNKNOWN_DURATION_SEEK_CAP_SECS
        };
        let target = Duration::from_secs_f32(secs.clamp(0.0, cap));
        debug!(chapter = self.state.chapter_id, to = ?target, "Seek");
        self.output.seek(target);
        self.state.position = target;
    }

    pub fn set_volume(&mut self, volume: f32) {
        let clamped = volume.clamp(0.0, 1.0);
        self.output.set_volume(clamped);
        self.state.volume = clamped;
    }

    pub fn set_speed(&mut self, speed: f32) {
        let clamped = speed.clamp(MIN_SPEED, MAX_SPEED);
        self.output.set_speed(clamped);
        self.state.speed = clamped;
    }

    /// Switch to another chapter: reset the transient playback state, swap
    /// the source, and re-command the user's levels onto it. Unknown ids are
    /// ignored. Each switch starts a new event epoch so late events from the
    /// superseded source cannot clobber the new chapter's state.
    pub fn select_chapter(&mut self, chapter_id: u32) {
        if chapter_id == self.state.chapter_id {
            debug!(chapter_id, "Chapter already selected");
            return;
        }
        let Some(audio) = self
            .chapters
            .iter()
            .find(|chapter| chapter.id == chapter_id)
            .map(|chapter| chapter.audio.clone())
        else {
            warn!(chapter_id, "Ignoring selection of unknown chapter");
            return;
        };

        self.epoch = self.epoch.wrapping_add(1);
        info!(
            from = self.state.chapter_id,
            to = chapter_id,
            epoch = self.epoch,
            "Switching chapter"
        );
        self.state.chapter_id = chapter_id;
        self.state.position = Duration::ZERO;
        self.state.duration = Duration::ZERO;
        self.state.is_playing = false;

        if let Err(err) = self.output.load(&audio) {
            warn!(chapter = chapter_id, "Failed to load chapter audio: {err:#}");
        }
        self.output.set_volume(self.state.volume);
        self.output.set_speed(self.state.speed);
    }

    /// Drain the output's pending events and fold them into the state.
    pub fn pump(&mut self) {
        let epoch = self.epoch;
        for event in self.output.poll() {
            self.apply_event(epoch, event);
        }
    }

    /// Apply one playback event tagged with the epoch it was generated
    /// under. Events from a superseded chapter selection are dropped.
    pub fn apply_event(&mut self, epoch: u64, event: AudioEvent) {
        if epoch != self.epoch {
            debug!(
                epoch,
                current = self.epoch,
                ?event,
                "Ignoring stale playback event"
            );
            return;
        }
        match event {
            AudioEvent::PositionChanged(position) => {
                self.state.position = if self.state.duration > Duration::ZERO {
                    position.min(self.state.duration)
                } else {
                    position
                };
            }
            AudioEvent::DurationKnown(duration) => {
                debug!(chapter = self.state.chapter_id, ?duration, "Duration known");
                self.state.duration = duration;
            }
            AudioEvent::Started => self.state.is_playing = true,
            AudioEvent::Paused => self.state.is_playing = false,
            AudioEvent::Finished => {
                info!(chapter = self.state.chapter_id, "Chapter playback finished");
                self.state.is_playing = false;
                if self.state.duration > Duration::ZERO {
                    self.state.position = self.state.duration;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    #[derive(Default)]
    struct Commands {
        loads: Vec<PathBuf>,
        plays: usize,
        pauses: usize,
        seeks: Vec<Duration>,
        volumes: Vec<f32>,
        speeds: Vec<f32>,
        queued: Vec<AudioEvent>,
        fail_load: bool,
    }

    struct MockOutput(Rc<RefCell<Commands>>);

    impl AudioOutput for MockOutput {
        fn load(&mut self, source: &std::path::Path) -> Result<()> {
            let mut inner = self.0.borrow_mut();
            inner.queued.clear();
            if inner.fail_load {
                bail!("mock load failure");
            }
            inner.loads.push(source.to_path_buf());
            Ok(())
        }

        fn play(&mut self) {
            self.0.borrow_mut().plays += 1;
        }

        fn pause(&mut self) {
            self.0.borrow_mut().pauses += 1;
        }

        fn seek(&mut self, position: Duration) {
            self.0.borrow_mut().seeks.push(position);
        }

        fn set_volume(&mut self, volume: f32) {
            self.0.borrow_mut().volumes.push(volume);
        }

        fn set_speed(&mut self, speed: f32) {
            self.0.borrow_mut().speeds.push(speed);
        }

        fn poll(&mut self) -> Vec<AudioEvent> {
            std::mem::take(&mut self.0.borrow_mut().queued)
        }
    }

    fn chapter(id: u32, title: &str) -> Chapter {
        Chapter {
            id,
            title: title.to_string(),
            audio: PathBuf::from(format!("ch{id}.mp3")),
            text: format!("Text of chapter {id}."),
        }
    }

    fn mounted() -> (ChapterPlayer, Rc<RefCell<Commands>>) {
        let commands = Rc::new(RefCell::new(Commands::default()));
        let player = ChapterPlayer::new(
            vec![chapter(1, "A"), chapter(2, "B")],
            Box::new(MockOutput(commands.clone())),
        )
        .unwrap();
        (player, commands)
    }

    #[test]
    fn mounts_with_first_chapter_defaults() {
        let (player, commands) = mounted();
        let state = player.state();
        assert_eq!(state.chapter_id, 1);
        assert!(!state.is_playing);
        assert_eq!(state.position, Duration::ZERO);
        assert_eq!(state.duration, Duration::ZERO);
        assert_eq!(state.volume, 1.0);
        assert_eq!(commands.borrow().loads, vec![PathBuf::from("ch1.mp3")]);
    }

    #[test]
    fn mount_requires_a_chapter() {
        let commands = Rc::new(RefCell::new(Commands::default()));
        assert!(ChapterPlayer::new(Vec::new(), Box::new(MockOutput(commands))).is_err());
    }

    #[test]
    fn unloadable_source_degrades_silently() {
        let commands = Rc::new(RefCell::new(Commands::default()));
        commands.borrow_mut().fail_load = true;
        let mut player =
            ChapterPlayer::new(vec![chapter(1, "A")], Box::new(MockOutput(commands.clone())))
                .unwrap();

        player.toggle_play_pause();
        player.pump();
        assert!(!player.is_playing());
        assert_eq!(player.state().duration, Duration::ZERO);
    }

    #[test]
    fn toggle_commands_output_but_waits_for_events() {
        let (mut player, commands) = mounted();

        player.toggle_play_pause();
        assert_eq!(commands.borrow().plays, 1);
        assert!(!player.is_playing(), "play must be event-confirmed");

        let epoch = player.epoch();
        player.apply_event(epoch, AudioEvent::Started);
        assert!(player.is_playing());

        player.toggle_play_pause();
        assert_eq!(commands.borrow().pauses, 1);
        assert!(player.is_playing(), "pause must be event-confirmed");
        player.apply_event(epoch, AudioEvent::Paused);
        assert!(!player.is_playing());
    }

    #[test]
    fn seek_clamps_to_known_duration() {
        let (mut player, commands) = mounted();
        let epoch = player.epoch();
        player.apply_event(epoch, AudioEvent::DurationKnown(Duration::from_secs(120)));

        player.seek_to(140.0);
        assert_eq!(player.state().position, Duration::from_secs(120));
        player.seek_to(-3.0);
        assert_eq!(player.state().position, Duration::ZERO);
        assert_eq!(
            commands.borrow().seeks,
            vec![Duration::from_secs(120), Duration::ZERO]
        );
    }

    #[test]
    fn seek_uses_fallback_cap_while_duration_unknown() {
        let (mut player, _commands) = mounted();
        player.seek_to(250.0);
        assert_eq!(
            player.state().position,
            Duration::from_secs_f32(UNKNOWN_DURATION_SEEK_CAP_SECS)
        );
    }

    #[test]
    fn skip_is_idempotent_at_the_boundaries() {
        let (mut player, _commands) = mounted();
        let epoch = player.epoch();
        player.apply_event(epoch, AudioEvent::DurationKnown(Duration::from_secs(120)));

        player.skip(-SKIP_STEP_SECS);
        assert_eq!(player.state().position, Duration::ZERO);

        player.seek_to(120.0);
        player.skip(SKIP_STEP_SECS);
        assert_eq!(player.state().position, Duration::from_secs(120));
    }

    #[test]
    fn skip_stays_at_zero_while_duration_unknown() {
        let (mut player, _commands) = mounted();
        player.skip(SKIP_STEP_SECS);
        assert_eq!(player.state().position, Duration::ZERO);
    }

    #[test]
    fn volume_is_clamped_and_does_not_affect_playback() {
        let (mut player, commands) = mounted();
        let epoch = player.epoch();
        player.apply_event(epoch, AudioEvent::Started);

        player.set_volume(1.7);
        assert_eq!(player.state().volume, 1.0);
        player.set_volume(-0.2);
        assert_eq!(player.state().volume, 0.0);
        assert!(player.is_playing());
        assert_eq!(commands.borrow().volumes, vec![1.0, 0.0]);
    }

    #[test]
    fn chapter_switch_resets_transient_state() {
        let (mut player, commands) = mounted();
        let epoch = player.epoch();
        player.apply_event(epoch, AudioEvent::DurationKnown(Duration::from_secs(120)));
        player.apply_event(epoch, AudioEvent::Started);
        player.seek_to(90.0);

        player.select_chapter(2);
        let state = player.state();
        assert_eq!(state.chapter_id, 2);
        assert_eq!(state.position, Duration::ZERO);
        assert_eq!(state.duration, Duration::ZERO);
        assert!(!state.is_playing);
        assert_eq!(
            commands.borrow().loads,
            vec![PathBuf::from("ch1.mp3"), PathBuf::from("ch2.mp3")]
        );
    }

    #[test]
    fn levels_survive_a_chapter_switch() {
        let (mut player, commands) = mounted();
        player.set_volume(0.4);
        player.set_speed(1.5);

        player.select_chapter(2);
        let state = player.state();
        assert_eq!(state.volume, 0.4);
        assert_eq!(state.speed, 1.5);
        // Re-commanded onto the fresh source after the swap.
        assert_eq!(commands.borrow().volumes.last(), Some(&0.4));
        assert_eq!(commands.borrow().speeds.last(), Some(&1.5));
    }

    #[test]
    fn unknown_chapter_selection_is_ignored() {
        let (mut player, commands) = mounted();
        player.select_chapter(99);
        assert_eq!(player.state().chapter_id, 1);
        assert_eq!(commands.borrow().loads.len(), 1);
    }

    #[test]
    fn stale_epoch_events_are_dropped() {
        let (mut player, _commands) = mounted();
        let old_epoch = player.epoch();
        player.select_chapter(2);

        // Metadata from the slow-loading previous chapter arrives late.
        player.apply_event(old_epoch, AudioEvent::DurationKnown(Duration::from_secs(300)));
        assert_eq!(player.state().duration, Duration::ZERO);

        player.apply_event(player.epoch(), AudioEvent::DurationKnown(Duration::from_secs(80)));
        assert_eq!(player.state().duration, Duration::from_secs(80));
    }

    #[test]
    fn finished_stops_playback_without_advancing() {
        let (mut player, _commands) = mounted();
        let epoch = player.epoch();
        player.apply_event(epoch, AudioEvent::DurationKnown(Duration::from_secs(120)));
        player.apply_event(epoch, AudioEvent::Started);
        player.apply_event(epoch, AudioEvent::PositionChanged(Duration::from_secs(119)));

        player.apply_event(epoch, AudioEvent::Finished);
        let state = player.state();
        assert!(!state.is_playing);
        assert_eq!(state.position, Duration::from_secs(120));
        assert_eq!(state.chapter_id, 1, "no auto-advance to the next chapter");
    }

    #[test]
    fn position_updates_are_idempotent_overwrites() {
        let (mut player, _commands) = mounted();
        let epoch = player.epoch();
        player.apply_event(epoch, AudioEvent::DurationKnown(Duration::from_secs(120)));
        for _ in 0..3 {
            player.apply_event(epoch, AudioEvent::PositionChanged(Duration::from_secs(42)));
        }
        assert_eq!(player.state().position, Duration::from_secs(42));

        // A position past the known end clamps to it.
        player.apply_event(epoch, AudioEvent::PositionChanged(Duration::from_secs(500)));
        assert_eq!(player.state().position, Duration::from_secs(120));
    }

    #[test]
    fn metadata_then_seek_then_switch_end_to_end() {
        let (mut player, commands) = mounted();
        assert_eq!(player.state().chapter_id, 1);
        assert_eq!(player.state().duration, Duration::ZERO);

        let epoch = player.epoch();
        player.apply_event(epoch, AudioEvent::DurationKnown(Duration::from_secs(120)));
        player.seek_to(140.0);
        assert_eq!(player.state().position, Duration::from_secs(120));

        player.select_chapter(2);
        let state = player.state();
        assert_eq!(
            (state.chapter_id, state.position, state.duration, state.is_playing),
            (2, Duration::ZERO, Duration::ZERO, false)
        );
        assert_eq!(
            commands.borrow().loads.last(),
            Some(&PathBuf::from("ch2.mp3"))
        );
    }
}
