use crate::audio::{AudioOutput, NullOutput, RodioOutput};
use crate::book::Book;
use crate::cache::{BookSettings, load_book_settings, save_book_settings};
use crate::config::{AppConfig, ThemeMode};
use crate::content::ContentLibrary;
use crate::player::ChapterPlayer;
use anyhow::Result;
use iced::widget::scrollable::Id as ScrollId;
use once_cell::sync::Lazy;
use std::path::PathBuf;
use tracing::{info, warn};

pub(crate) static CONTENT_SCROLL_ID: Lazy<ScrollId> =
    Lazy::new(|| ScrollId::new("content-scroll"));

/// Entry shown in the chapter selector.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterChoice {
    pub id: u32,
    pub title: String,
}

impl std::fmt::Display for ChapterChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Core application state.
pub struct App {
    pub(super) book: Book,
    pub(super) book_path: PathBuf,
    pub(super) content: ContentLibrary,
    pub(super) player: ChapterPlayer,
    pub(super) night_mode: bool,
    pub(super) tick_millis: u64,
}

impl App {
    pub(super) fn bootstrap(book: Book, config: AppConfig, book_path: PathBuf) -> Result<App> {
        let output: Box<dyn AudioOutput> = match RodioOutput::new() {
            Ok(output) => Box::new(output),
            Err(err) => {
                warn!("No audio device available, starting silent: {err:#}");
                Box::new(NullOutput)
            }
        };
        Self::with_output(book, config, book_path, output)
    }

    pub(super) fn with_output(
        book: Book,
        config: AppConfig,
        book_path: PathBuf,
        output: Box<dyn AudioOutput>,
    ) -> Result<App> {
        let settings = load_book_settings(&book_path);
        if settings.is_some() {
            info!("Loaded per-book settings from cache");
        }
        let theme = settings.as_ref().map(|s| s.theme).unwrap_or(config.theme);
        let volume = settings.as_ref().map(|s| s.volume).unwrap_or(config.volume);
        let speed = settings
            .as_ref()
            .map(|s| s.playback_speed)
            .unwrap_or(config.playback_speed);

        let content = ContentLibrary::from_book(&book);
        let mut player = ChapterPlayer::new(book.chapters.clone(), output)?;
        player.set_volume(volume);
        player.set_speed(speed);

        info!(
            book = %book.title,
            chapters = book.chapters.len(),
            volume = player.state().volume,
            "Initialized app state"
        );
        Ok(App {
            book,
            book_path,
            content,
            player,
            night_mode: matches!(theme, ThemeMode::Night),
            tick_millis: config.tick_millis.clamp(50, 1000),
        })
    }

    pub(super) fn chapter_choices(&self) -> Vec<ChapterChoice> {
        self.book
            .chapters
            .iter()
            .map(|chapter| ChapterChoice {
                id: chapter.id,
                title: chapter.title.clone(),
            })
            .collect()
    }

    pub(super) fn selected_choice(&self) -> Option<ChapterChoice> {
        let current = self.player.current_chapter();
        Some(ChapterChoice {
            id: current.id,
            title: current.title.clone(),
        })
    }

    pub(super) fn save_settings(&self) {
        let state = self.player.state();
        save_book_settings(
            &self.book_path,
            &BookSettings {
                theme: if self.night_mode {
                    ThemeMode::Night
                } else {
                    ThemeMode::Day
                },
                volume: state.volume,
                playback_speed: state.speed,
            },
        );
    }
}
