//! Clock-label helpers for the transport display.

use std::time::Duration;

/// Render a playback position as `minutes:seconds`, seconds zero-padded to
/// two digits. Floor semantics, so the label never runs ahead of the audio.
/// Chapter recordings stay well under an hour, so there is no hours part.
pub fn clock_label(position: Duration) -> String {
    let total = position.as_secs();
    format!("{}:{:02}", total / 60, total % 60)
}
