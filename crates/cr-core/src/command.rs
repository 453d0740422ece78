//! The abstract input contract between the UI layer and the engine.

use serde::{Deserialize, Serialize};

/// Scroll target edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Bottom,
}

/// Paging direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
}

/// Commands the UI layer produces from raw key/mouse/wheel events.
///
/// The engine never sees physical events; every binding decision
/// (which key scrolls, which wheel notch pages) stays in the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewerCommand {
    /// Scroll by a pixel delta (negative scrolls toward the top).
    ScrollBy(i32),
    /// Jump to the top or bottom of the current chapter.
    ScrollToEdge(Edge),
    /// Scroll by one page step in the given direction.
    StepPage(Direction),
    NextChapter,
    PreviousChapter,
    ToggleFullscreen,
    ToggleMenu,
    /// Close the viewer and return to the library.
    Close,
}
