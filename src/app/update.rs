use super::messages::Message;
use super::state::App;
use crate::player::SKIP_STEP_SECS;
use iced::time;
use iced::{Subscription, Task};
use std::time::Duration;
use tracing::info;

impl App {
    pub fn subscription(app: &App) -> Subscription<Message> {
        // Poll the output while it can still produce events: during playback
        // for position updates, and before metadata arrives for the duration.
        if app.player.is_playing() || app.player.awaiting_duration() {
            time::every(Duration::from_millis(app.tick_millis)).map(Message::Tick)
        } else {
            Subscription::none()
        }
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TogglePlayPause => {
                self.player.toggle_play_pause();
            }
            Message::SkipBackward => {
                self.player.skip(-SKIP_STEP_SECS);
            }
            Message::SkipForward => {
                self.player.skip(SKIP_STEP_SECS);
            }
            Message::SeekTo(secs) => {
                self.player.seek_to(secs);
            }
            Message::VolumeChanged(percent) => {
                self.player.set_volume(percent / 100.0);
                self.save_settings();
            }
            Message::SpeedChanged(speed) => {
                self.player.set_speed(speed);
                self.save_settings();
            }
            Message::ChapterSelected(choice) => {
                info!(chapter = choice.id, title = %choice.title, "Chapter selected");
                self.player.select_chapter(choice.id);
            }
            Message::ToggleTheme => {
                info!(night_mode = !self.night_mode, "Toggled theme");
                self.night_mode = !self.night_mode;
                self.save_settings();
            }
            Message::Tick(_now) => {}
        }

        // Every turn of the loop drains whatever the output produced, so
        // command confirmations arrive without waiting for the next tick.
        self.player.pump();
        Task::none()
    }
}
