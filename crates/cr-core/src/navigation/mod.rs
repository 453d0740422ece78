use std::time::Instant;

use serde::{Deserialize, Serialize};

mod engine;
mod subscriber;

pub use engine::NavigationEngine;
pub use subscriber::NavigationSubscriber;

/// Lifecycle of one reading session.
///
/// `Transitioning` is a debounce window with a monotonic deadline; it is
/// released by the clock reaching `until`, not by the chapter load
/// finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No chapter open.
    Idle,
    /// Extracting chapter assets.
    Loading,
    /// Interactive.
    Viewing,
    /// Viewing, but chapter-transition input is locked out.
    Transitioning { until: Instant },
}

/// Step size and animation duration for one input class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTiming {
    /// Pixels per step, before UI scaling.
    pub step: i32,
    /// Tween duration in milliseconds.
    pub duration: u64,
}

/// Engine tuning, read once from the settings store at session start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    pub scroll: StepTiming,
    pub page: StepTiming,
    /// Page images are fit to this width.
    pub viewer_width: i32,
    pub ui_scale: f32,
    /// Debounce window for chapter transitions, in milliseconds.
    pub debounce: u64,
}

impl Tuning {
    /// Apply the UI scale factor to a pixel value.
    pub fn scaled(&self, value: i32) -> i32 {
        (value as f32 * self.ui_scale) as i32
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            scroll: StepTiming {
                step: 100,
                duration: 100,
            },
            page: StepTiming {
                step: 500,
                duration: 400,
            },
            viewer_width: 800,
            ui_scale: 1.0,
            debounce: 1000,
        }
    }
}

/// Snapshot passed to subscribers after every state change.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationContext {
    pub phase: SessionPhase,
    pub title: Option<String>,
    pub chapter_count: usize,
    pub current_index: Option<usize>,
    pub current_chapter: Option<String>,
    pub page_count: usize,
    pub scroll_offset: i32,
    pub scroll_max: i32,
    pub is_fullscreen: bool,
    pub is_menu_visible: bool,
    /// Chapters at or before this index render as read. Derived view
    /// state, never persisted.
    pub read_through: Option<usize>,
}
