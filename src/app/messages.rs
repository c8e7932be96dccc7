use super::state::ChapterChoice;
use std::time::Instant;

/// Messages emitted by the UI.
#[derive(Debug, Clone)]
pub enum Message {
    TogglePlayPause,
    SkipBackward,
    SkipForward,
    /// Absolute seek target from the seek bar, in seconds.
    SeekTo(f32),
    /// Volume from the volume slider, as a percentage in `[0, 100]`.
    VolumeChanged(f32),
    SpeedChanged(f32),
    ChapterSelected(ChapterChoice),
    ToggleTheme,
    Tick(Instant),
}
