//! Core functionality for the comic reading engine
//!
//! This crate provides the domain model and the session state machine
//! that drives a continuous-scroll reading session. It is agnostic to
//! any windowing toolkit: the UI layer translates raw input into
//! [`ViewerCommand`] values and feeds them to the [`NavigationEngine`].

pub mod clock;
pub mod command;
pub mod events;
pub mod library;
pub mod navigation;
pub mod progress;
pub mod tween;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{Direction, Edge, ViewerCommand};
pub use library::{Chapter, ChapterNumber, Title};
pub use navigation::{
    NavigationContext, NavigationEngine, NavigationSubscriber, SessionPhase, StepTiming, Tuning,
};
pub use progress::{ProgressRecord, ProgressStore};
pub use assets::ChapterAssetExtractor;

// Trait implemented by the data layer; the engine only consumes the
// ordered page list and is agnostic to extraction mechanics.
pub mod assets {
    use std::path::{Path, PathBuf};

    /// Materializes the page images of a chapter archive into local files.
    pub trait ChapterAssetExtractor: Send + Sync {
        /// Extract the archive and return the page paths in
        /// archive-listing order, filtered to image entries.
        ///
        /// Must be idempotent for the same archive and must run to
        /// completion before the pages are handed to the viewer.
        fn extract(&self, archive: &Path) -> anyhow::Result<Vec<PathBuf>>;
    }
}
