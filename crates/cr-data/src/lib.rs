//! Filesystem-facing stores for the comic reader: the library catalog,
//! per-title progress records, the settings document and chapter
//! archive extraction.

pub mod catalog;
pub mod extract;
pub mod progress;
pub mod settings;

use std::path::PathBuf;

use thiserror::Error;

// Re-exports
pub use catalog::{list_chapters, list_titles, ARCHIVE_EXTENSION};
pub use extract::ZipExtractor;
pub use progress::JsonProgressStore;
pub use settings::{Orientation, Settings, SettingsStore, ViewerSettings};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("library root does not exist: {0}")]
    MissingLibraryRoot(PathBuf),

    #[error("no chapter number in file name: {0}")]
    MalformedChapterName(String),

    #[error("failed to read archive {path}: {message}")]
    ArchiveRead { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}
