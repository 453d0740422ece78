//! Navigation engine implementation

use std::path::PathBuf;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::{NavigationContext, NavigationSubscriber, SessionPhase, Tuning};
use crate::assets::ChapterAssetExtractor;
use crate::clock::Clock;
use crate::command::{Direction, Edge, ViewerCommand};
use crate::events::{events, EventBus};
use crate::library::{Chapter, Title};
use crate::progress::{ProgressRecord, ProgressStore};
use crate::tween::ScrollTween;

/// Session state stored internally
#[derive(Debug, Clone, Default)]
struct SessionState {
    loading: bool,
    title: Option<Title>,
    chapters: Vec<Chapter>,
    current_index: usize,
    record: Option<ProgressRecord>,
    pages: Vec<PathBuf>,
    scroll_offset: i32,
    scroll_max: i32,
    locked_until: Option<Instant>,
    is_fullscreen: bool,
    is_menu_visible: bool,
    tween: Option<ScrollTween>,
}

impl SessionState {
    fn is_viewing(&self) -> bool {
        !self.loading && self.title.is_some()
    }
}

/// The main navigation engine.
///
/// Owns the current chapter, the scroll offset within it, the debounce
/// lock and the viewer flags. One instance per session; all input
/// arrives through [`NavigationEngine::handle`] as abstract commands.
pub struct NavigationEngine {
    state: Arc<RwLock<SessionState>>,
    subscribers: Arc<RwLock<Vec<Weak<dyn NavigationSubscriber>>>>,
    progress: Arc<dyn ProgressStore>,
    extractor: Arc<dyn ChapterAssetExtractor>,
    event_bus: Arc<EventBus>,
    clock: Arc<dyn Clock>,
    tuning: Tuning,
}

impl NavigationEngine {
    /// Create a new navigation engine
    pub fn new(
        progress: Arc<dyn ProgressStore>,
        extractor: Arc<dyn ChapterAssetExtractor>,
        clock: Arc<dyn Clock>,
        tuning: Tuning,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            subscribers: Arc::new(RwLock::new(Vec::new())),
            progress,
            extractor,
            event_bus: Arc::new(EventBus::new()),
            clock,
            tuning,
        }
    }

    /// The bus the engine publishes session lifecycle events on.
    pub fn event_bus(&self) -> Arc<EventBus> {
        self.event_bus.clone()
    }

    /// Single entry point for the abstract command stream.
    pub fn handle(&self, command: ViewerCommand) -> anyhow::Result<()> {
        debug!(?command, "handling viewer command");
        match command {
            ViewerCommand::ScrollBy(delta) => self.scroll_by(delta, self.tuning.scroll.duration),
            ViewerCommand::ScrollToEdge(edge) => self.scroll_to_edge(edge),
            ViewerCommand::StepPage(direction) => {
                let step = self.tuning.scaled(self.tuning.page.step);
                let delta = match direction {
                    Direction::Forward => step,
                    Direction::Backward => -step,
                };
                self.scroll_by(delta, self.tuning.page.duration)
            }
            ViewerCommand::NextChapter => self.next_chapter(),
            ViewerCommand::PreviousChapter => self.previous_chapter(),
            ViewerCommand::ToggleFullscreen => {
                self.toggle_fullscreen();
                Ok(())
            }
            ViewerCommand::ToggleMenu => {
                self.toggle_menu();
                Ok(())
            }
            ViewerCommand::Close => self.close(),
        }
    }

    /// Open a chapter of `title` by index into `chapters`.
    ///
    /// Persists `last_chapter` before extraction so a crash mid-read
    /// still resumes at the right chapter; the scroll offset is restored
    /// from the progress record only when the record already points at
    /// this chapter. On extraction failure the previous state is kept
    /// and the error is returned for the shell to surface.
    pub fn open_chapter(
        &self,
        title: &Title,
        chapters: &[Chapter],
        index: usize,
    ) -> anyhow::Result<()> {
        if index >= chapters.len() {
            anyhow::bail!(
                "chapter index {} out of bounds ({} chapters)",
                index,
                chapters.len()
            );
        }
        let chapter = chapters[index].clone();
        let archive = title.chapter_path(&chapter.file_name);

        let mut record = self.progress.load(title)?;
        // Resume offset comes from the record as it was before this open.
        let resume = match record.last_chapter.as_deref() {
            Some(last) if last == chapter.file_name => record.last_position.unwrap_or(0).max(0),
            _ => 0,
        };
        record.set_last_chapter(&chapter.file_name);
        self.progress.save(title, &mut record)?;

        {
            let mut state = self.state.write();
            state.loading = true;
        }
        self.notify_subscribers();

        let pages = match self.extractor.extract(&archive) {
            Ok(pages) => pages,
            Err(error) => {
                warn!(chapter = %chapter.file_name, %error, "chapter extraction failed");
                {
                    let mut state = self.state.write();
                    state.loading = false;
                }
                self.event_bus.publish(events::ExtractionFailed {
                    chapter: chapter.file_name.clone(),
                    error: error.to_string(),
                });
                self.notify_subscribers();
                return Err(error);
            }
        };

        let page_count = pages.len();
        {
            let mut state = self.state.write();
            // Provisional extent until the presenter reports the real
            // laid-out height via `set_scroll_extent`.
            let provisional = page_count as i32 * self.tuning.scaled(self.tuning.viewer_width);
            state.loading = false;
            state.title = Some(title.clone());
            state.chapters = chapters.to_vec();
            state.current_index = index;
            state.record = Some(record);
            state.pages = pages;
            state.scroll_max = provisional.max(resume);
            state.scroll_offset = resume;
            state.tween = None;
        }

        info!(
            title = %title.name,
            chapter = %chapter.file_name,
            pages = page_count,
            resumed_at = resume,
            "chapter opened"
        );
        self.event_bus.publish(events::ChapterOpened {
            title: title.name.clone(),
            chapter: chapter.file_name,
            page_count,
            resumed_at: resume,
        });
        self.notify_subscribers();
        Ok(())
    }

    /// Report the laid-out scroll extent of the current chapter.
    pub fn set_scroll_extent(&self, max: i32) {
        {
            let mut state = self.state.write();
            state.scroll_max = max.max(0);
            state.scroll_offset = state.scroll_offset.clamp(0, state.scroll_max);
        }
        self.notify_subscribers();
    }

    /// Scroll by `delta` pixels with a tween of `duration` milliseconds.
    ///
    /// At the top edge a negative delta is reinterpreted as a
    /// previous-chapter request, at the bottom edge a positive delta as a
    /// next-chapter request; this is what auto-advances chapters during
    /// continuous scrolling.
    fn scroll_by(&self, delta: i32, duration: u64) -> anyhow::Result<()> {
        let now = self.clock.now();
        let (title, position) = {
            let mut state = self.state.write();
            if !state.is_viewing() {
                return Ok(());
            }
            if delta < 0 && state.scroll_offset == 0 {
                drop(state);
                return self.previous_chapter();
            }
            if delta > 0 && state.scroll_offset == state.scroll_max {
                drop(state);
                return self.next_chapter();
            }

            let anchor = state
                .tween
                .map(|t| t.sample(now))
                .unwrap_or(state.scroll_offset);
            let target = (state.scroll_offset + delta).clamp(0, state.scroll_max);
            state.tween = Some(ScrollTween::new(
                anchor,
                target,
                now,
                Duration::from_millis(duration),
            ));
            state.scroll_offset = target;

            let title = state.title.clone();
            if let Some(record) = state.record.as_mut() {
                record.set_last_position(target);
            }
            (title, target)
        };
        self.persist_position(title.as_ref(), position)?;
        self.notify_subscribers();
        Ok(())
    }

    /// Jump to the top or bottom of the current chapter. Edge jumps
    /// never trigger a chapter change.
    fn scroll_to_edge(&self, edge: Edge) -> anyhow::Result<()> {
        let now = self.clock.now();
        let (title, position) = {
            let mut state = self.state.write();
            if !state.is_viewing() {
                return Ok(());
            }
            let target = match edge {
                Edge::Top => 0,
                Edge::Bottom => state.scroll_max,
            };
            let anchor = state
                .tween
                .map(|t| t.sample(now))
                .unwrap_or(state.scroll_offset);
            state.tween = Some(ScrollTween::new(
                anchor,
                target,
                now,
                Duration::from_millis(self.tuning.scroll.duration),
            ));
            state.scroll_offset = target;

            let title = state.title.clone();
            if let Some(record) = state.record.as_mut() {
                record.set_last_position(target);
            }
            (title, target)
        };
        self.persist_position(title.as_ref(), position)?;
        self.notify_subscribers();
        Ok(())
    }

    /// Move to the previous chapter, or close the viewer at the first.
    ///
    /// No-op while the debounce lock is held; acquiring the lock cancels
    /// any in-flight tween.
    pub fn previous_chapter(&self) -> anyhow::Result<()> {
        let Some((title, chapters, index)) = self.begin_transition()? else {
            return Ok(());
        };
        if index == 0 {
            // First chapter: close rather than wrap.
            return self.close();
        }
        self.open_chapter(&title, &chapters, index - 1)
    }

    /// Move to the next chapter, or close the viewer at the last.
    pub fn next_chapter(&self) -> anyhow::Result<()> {
        let Some((title, chapters, index)) = self.begin_transition()? else {
            return Ok(());
        };
        if index + 1 == chapters.len() {
            // Last chapter: close rather than wrap.
            return self.close();
        }
        self.open_chapter(&title, &chapters, index + 1)
    }

    /// Acquire the debounce lock. Returns the session snapshot to
    /// transition from, or `None` when locked or not viewing.
    fn begin_transition(&self) -> anyhow::Result<Option<(Title, Vec<Chapter>, usize)>> {
        let now = self.clock.now();
        let mut state = self.state.write();
        // A transition request always stops the in-flight tween, even
        // when the lock swallows the transition itself.
        state.tween = None;
        if let Some(until) = state.locked_until {
            if now < until {
                debug!("chapter transition debounced");
                return Ok(None);
            }
        }
        if !state.is_viewing() {
            return Ok(None);
        }
        let (Some(title), chapters) = (state.title.clone(), state.chapters.clone()) else {
            return Ok(None);
        };
        state.locked_until = Some(now + Duration::from_millis(self.tuning.debounce));
        Ok(Some((title, chapters, state.current_index)))
    }

    pub fn toggle_fullscreen(&self) {
        {
            let mut state = self.state.write();
            state.is_fullscreen = !state.is_fullscreen;
        }
        self.notify_subscribers();
    }

    pub fn toggle_menu(&self) {
        {
            let mut state = self.state.write();
            state.is_menu_visible = !state.is_menu_visible;
        }
        self.notify_subscribers();
    }

    /// Persist the current position and return to `Idle`.
    pub fn close(&self) -> anyhow::Result<()> {
        let (title, chapter, position) = {
            let mut state = self.state.write();
            if state.title.is_none() {
                return Ok(());
            }
            let title = state.title.take();
            let chapter = state
                .chapters
                .get(state.current_index)
                .map(|c| c.file_name.clone());
            let position = state.scroll_offset;
            if let Some(record) = state.record.as_mut() {
                record.set_last_position(position);
            }
            let mut record = state.record.take();
            if let (Some(title), Some(record)) = (title.as_ref(), record.as_mut()) {
                self.progress.save(title, record)?;
            }
            state.chapters.clear();
            state.pages.clear();
            state.current_index = 0;
            state.scroll_offset = 0;
            state.scroll_max = 0;
            state.tween = None;
            state.loading = false;
            (title, chapter, position)
        };

        if let (Some(title), Some(chapter)) = (title, chapter) {
            info!(title = %title.name, chapter = %chapter, "viewer closed");
            self.event_bus.publish(events::ProgressSaved {
                title: title.name.clone(),
                chapter: chapter.clone(),
                position,
            });
            self.event_bus.publish(events::ChapterClosed {
                title: title.name,
                chapter,
            });
        }
        self.notify_subscribers();
        Ok(())
    }

    /// Current phase, with the debounce deadline surfaced as
    /// `Transitioning` while it is in the future.
    pub fn phase(&self) -> SessionPhase {
        let state = self.state.read();
        if state.loading {
            return SessionPhase::Loading;
        }
        if !state.is_viewing() {
            return SessionPhase::Idle;
        }
        if let Some(until) = state.locked_until {
            if self.clock.now() < until {
                return SessionPhase::Transitioning { until };
            }
        }
        SessionPhase::Viewing
    }

    /// Smoothed scroll offset for presentation, sampled from the
    /// in-flight tween when one is running.
    pub fn animated_offset(&self) -> i32 {
        let now = self.clock.now();
        let state = self.state.read();
        state
            .tween
            .map(|t| t.sample(now))
            .unwrap_or(state.scroll_offset)
    }

    /// Get current navigation context
    pub fn context(&self) -> NavigationContext {
        let phase = self.phase();
        let state = self.state.read();
        let current = state
            .title
            .is_some()
            .then_some(state.current_index)
            .filter(|_| !state.chapters.is_empty());
        NavigationContext {
            phase,
            title: state.title.as_ref().map(|t| t.name.clone()),
            chapter_count: state.chapters.len(),
            current_index: current,
            current_chapter: current
                .and_then(|i| state.chapters.get(i))
                .map(|c| c.file_name.clone()),
            page_count: state.pages.len(),
            scroll_offset: state.scroll_offset,
            scroll_max: state.scroll_max,
            is_fullscreen: state.is_fullscreen,
            is_menu_visible: state.is_menu_visible,
            read_through: current,
        }
    }

    /// Page paths of the open chapter, in reading order.
    pub fn pages(&self) -> Vec<PathBuf> {
        self.state.read().pages.clone()
    }

    /// Add a subscriber
    pub fn add_subscriber(&self, subscriber: Arc<dyn NavigationSubscriber>) {
        let mut subscribers = self.subscribers.write();
        subscribers.push(Arc::downgrade(&subscriber));
    }

    fn persist_position(&self, title: Option<&Title>, position: i32) -> anyhow::Result<()> {
        let Some(title) = title else {
            return Ok(());
        };
        let (chapter, mut record) = {
            let state = self.state.read();
            let chapter = state
                .chapters
                .get(state.current_index)
                .map(|c| c.file_name.clone());
            (chapter, state.record.clone())
        };
        if let Some(record) = record.as_mut() {
            self.progress.save(title, record)?;
            self.state.write().record = Some(record.clone());
            if let Some(chapter) = chapter {
                self.event_bus.publish(events::ProgressSaved {
                    title: title.name.clone(),
                    chapter,
                    position,
                });
            }
        }
        Ok(())
    }

    /// Notify all subscribers of a state change
    fn notify_subscribers(&self) {
        let context = self.context();
        let mut subscribers = self.subscribers.write();

        // Remove any dead weak references
        subscribers.retain(|weak| weak.strong_count() > 0);

        // Notify live subscribers
        for weak in subscribers.iter() {
            if let Some(subscriber) = weak.upgrade() {
                subscriber.on_navigation_change(&context);
            }
        }
    }
}
