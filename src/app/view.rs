use super::messages::Message;
use super::state::{App, CONTENT_SCROLL_ID};
use crate::player::{MAX_SPEED, MIN_SPEED, UNKNOWN_DURATION_SEEK_CAP_SECS};
use crate::timefmt::clock_label;
use iced::alignment::Vertical;
use iced::widget::{
    Column, button, column, container, horizontal_space, image, pick_list, row, scrollable,
    slider, text,
};
use iced::{Element, Length};
use std::time::Duration;

impl App {
    pub fn view(&self) -> Element<'_, Message> {
        let state = self.player.state();
        let chapter = self.player.current_chapter();

        let theme_toggle = button(if self.night_mode { "Day Mode" } else { "Night Mode" })
            .on_press(Message::ToggleTheme);
        let header = row![
            text(self.book.title.as_str()).size(26),
            horizontal_space(),
            theme_toggle
        ]
        .spacing(10)
        .align_y(Vertical::Center)
        .width(Length::Fill);

        let play_button = button(if state.is_playing { "Pause" } else { "Play" })
            .on_press(Message::TogglePlayPause);
        let transport = row![
            button("⏮ 15s").on_press(Message::SkipBackward),
            play_button,
            button("15s ⏭").on_press(Message::SkipForward),
        ]
        .spacing(10)
        .align_y(Vertical::Center);

        let seek_max = if state.duration > Duration::ZERO {
            state.duration.as_secs_f32()
        } else {
            UNKNOWN_DURATION_SEEK_CAP_SECS
        };
        let seek = column![
            row![
                text(clock_label(state.position)).size(14),
                horizontal_space(),
                text(clock_label(state.duration)).size(14),
            ]
            .width(Length::Fill),
            slider(
                0.0..=seek_max,
                state.position.as_secs_f32().min(seek_max),
                Message::SeekTo,
            )
            .step(1.0),
        ]
        .spacing(4);

        let volume = column![
            text(format!("Volume: {:.0}%", state.volume * 100.0)),
            slider(0.0..=100.0, state.volume * 100.0, Message::VolumeChanged).step(1.0),
        ]
        .spacing(4);

        let speed = column![
            text(format!("Speed: {:.2}x", state.speed)),
            slider(MIN_SPEED..=MAX_SPEED, state.speed, Message::SpeedChanged).step(0.25),
        ]
        .spacing(4);

        let selector = pick_list(
            self.chapter_choices(),
            self.selected_choice(),
            Message::ChapterSelected,
        )
        .width(Length::Fill);

        let mut panel: Column<'_, Message> = column![].spacing(12);
        if let Some(cover) = &self.book.cover {
            panel = panel.push(image(cover.clone()).width(Length::Fixed(180.0)));
        }
        panel = panel
            .push(text(chapter.title.as_str()).size(18))
            .push(transport)
            .push(seek)
            .push(volume)
            .push(speed)
            .push(selector);

        let content_view = scrollable(
            container(text(self.content.block_for(state.chapter_id)).size(16))
                .width(Length::Fill)
                .padding([12, 20]),
        )
        .id(CONTENT_SCROLL_ID.clone())
        .height(Length::Fill);

        let layout = row![
            container(panel).width(Length::FillPortion(1)).padding(12),
            container(content_view).width(Length::FillPortion(2)),
        ]
        .spacing(16)
        .height(Length::Fill);

        column![header, layout].padding(16).spacing(12).into()
    }
}
