mod messages;
mod state;
mod update;
mod view;

pub use state::App;

use crate::book::Book;
use crate::config::AppConfig;
use anyhow::{Context, Result};
use iced::{Size, Task, Theme, window};
use std::path::PathBuf;

/// Helper to launch the reader with a loaded book.
pub fn run_app(book: Book, config: AppConfig, book_path: PathBuf) -> Result<()> {
    let window_settings = window::Settings {
        size: Size::new(config.window_width, config.window_height),
        ..window::Settings::default()
    };

    let app = App::bootstrap(book, config, book_path)?;

    iced::application("Lectern", App::update, App::view)
        .window(window_settings)
        .subscription(App::subscription)
        .theme(|app: &App| {
            if app.night_mode {
                Theme::Dark
            } else {
                Theme::Light
            }
        })
        .run_with(move || (app, Task::none()))
        .context("Running the GUI event loop")?;
    Ok(())
}
