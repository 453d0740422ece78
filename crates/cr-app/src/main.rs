//! Main application entry point
//!
//! A terminal session shell for the reading engine: it lists the
//! library, resumes the last read title and translates line-based input
//! into the abstract command stream. Rendering pages is a presenter
//! concern and lives outside this binary.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use cr_core::events::{events, handler_from_fn, Event};
use cr_core::progress::ProgressStore as _;
use cr_core::{
    Direction, Edge, NavigationEngine, SessionPhase, SystemClock, Title, ViewerCommand,
};
use cr_data::{catalog, JsonProgressStore, SettingsStore, ZipExtractor};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    info!("Starting Comic Reader session shell");

    let mut settings = SettingsStore::load(&PathBuf::from("comicreader.json"))?;
    let library_root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.settings.library_root.clone());

    let titles = match catalog::list_titles(&library_root) {
        Ok(titles) => titles,
        Err(error) => {
            // Missing root is a user-visible empty state, not a crash.
            warn!(%error, "could not list library");
            println!("Library is empty: {error}");
            return Ok(());
        }
    };
    if titles.is_empty() {
        println!("No titles under {}", library_root.display());
        return Ok(());
    }

    println!("Library ({}):", library_root.display());
    for (index, title) in titles.iter().enumerate() {
        println!("  [{index}] {}", title.name);
    }

    let title = select_title(&settings.settings.last_read_title, &titles).clone();
    let chapters = catalog::list_chapters(&title)?;
    anyhow::ensure!(!chapters.is_empty(), "no chapters under {}", title.name);

    let progress = Arc::new(JsonProgressStore::new());
    let extractor = Arc::new(ZipExtractor::new(std::env::temp_dir().join("comicreader")));
    let tuning = settings.settings.tuning();
    let engine = NavigationEngine::new(
        progress.clone(),
        extractor.clone(),
        Arc::new(SystemClock),
        tuning,
    );

    let bus = engine.event_bus();
    bus.subscribe::<events::ChapterOpened>(handler_from_fn(|event: &dyn Event| {
        if let Some(opened) = event.as_any().downcast_ref::<events::ChapterOpened>() {
            println!(
                "-- {} ({} pages, resumed at {}px)",
                opened.chapter, opened.page_count, opened.resumed_at
            );
        }
    }));
    bus.subscribe::<events::ExtractionFailed>(handler_from_fn(|event: &dyn Event| {
        if let Some(failed) = event.as_any().downcast_ref::<events::ExtractionFailed>() {
            println!("!! could not open {}: {}", failed.chapter, failed.error);
        }
    }));

    let record = progress.load(&title)?;
    let start = record.resume_index(&chapters);
    engine.open_chapter(&title, &chapters, start)?;
    settings.set_last_read_title(Some(title.name.clone()))?;

    print_help();
    let scroll_step = tuning.scaled(tuning.scroll.step);
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let command = match line.trim() {
            "j" => ViewerCommand::ScrollBy(scroll_step),
            "k" => ViewerCommand::ScrollBy(-scroll_step),
            "g" => ViewerCommand::ScrollToEdge(Edge::Top),
            "G" => ViewerCommand::ScrollToEdge(Edge::Bottom),
            "" | "space" => ViewerCommand::StepPage(Direction::Forward),
            "b" => ViewerCommand::StepPage(Direction::Backward),
            "n" => ViewerCommand::NextChapter,
            "p" => ViewerCommand::PreviousChapter,
            "f" => ViewerCommand::ToggleFullscreen,
            "m" => ViewerCommand::ToggleMenu,
            "q" => ViewerCommand::Close,
            "?" => {
                print_help();
                continue;
            }
            other => {
                println!("unknown command: {other:?} (? for help)");
                continue;
            }
        };

        if let Err(error) = engine.handle(command) {
            // Retryable; the engine kept its previous state.
            warn!(%error, "command failed");
        }
        print_status(&engine);
        if engine.phase() == SessionPhase::Idle {
            break;
        }
        io::stdout().flush()?;
    }

    engine.close()?;
    if let Err(error) = extractor.clear_scratch() {
        warn!(%error, "could not clear scratch directory");
    }
    Ok(())
}

/// Resume the remembered title when it still exists, else the first.
fn select_title<'a>(last_read: &Option<String>, titles: &'a [Title]) -> &'a Title {
    last_read
        .as_deref()
        .and_then(|last| titles.iter().find(|t| t.name == last))
        .unwrap_or(&titles[0])
}

fn print_status(engine: &NavigationEngine) {
    let context = engine.context();
    let phase = match context.phase {
        SessionPhase::Idle => "idle",
        SessionPhase::Loading => "loading",
        SessionPhase::Viewing => "viewing",
        SessionPhase::Transitioning { .. } => "transitioning",
    };
    match (context.current_index, context.current_chapter) {
        (Some(index), Some(chapter)) => println!(
            "[{phase}] {} ({}/{}) {}px/{}px{}{}",
            chapter,
            index + 1,
            context.chapter_count,
            context.scroll_offset,
            context.scroll_max,
            if context.is_fullscreen {
                " [fullscreen]"
            } else {
                ""
            },
            if context.is_menu_visible { " [menu]" } else { "" },
        ),
        _ => println!("[{phase}]"),
    }
}

fn print_help() {
    println!(
        "commands: j/k scroll, enter/b page, g/G top/bottom, \
         n/p chapter, f fullscreen, m menu, q quit"
    );
}
