//! JSON-backed progress records, one sidecar file per title.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use tracing::{debug, warn};

use cr_core::library::Title;
use cr_core::progress::{ProgressRecord, ProgressStore};

use crate::DataError;

/// Sidecar file written next to the chapter archives.
pub const METADATA_FILE: &str = ".metadata.json";

/// Stores one [`ProgressRecord`] per title as
/// `<title-dir>/.metadata.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonProgressStore;

impl JsonProgressStore {
    pub fn new() -> Self {
        Self
    }

    pub fn metadata_path(title: &Title) -> PathBuf {
        title.directory.join(METADATA_FILE)
    }

    fn read(&self, title: &Title) -> Result<ProgressRecord, DataError> {
        let path = Self::metadata_path(title);
        if !path.exists() {
            // First access synthesizes the default record and persists
            // it immediately.
            let mut record = ProgressRecord::empty();
            self.write(title, &mut record)?;
            return Ok(record);
        }
        let raw = fs::read_to_string(&path)?;
        match serde_json::from_str(&raw) {
            Ok(record) => Ok(record),
            Err(error) => {
                // Recover instead of failing the whole title; the next
                // save overwrites the corrupt file.
                warn!(path = %path.display(), %error, "corrupt progress record, using defaults");
                Ok(ProgressRecord::empty())
            }
        }
    }

    fn write(&self, title: &Title, record: &mut ProgressRecord) -> Result<(), DataError> {
        record.last_updated = Utc::now();
        let path = Self::metadata_path(title);
        // Full overwrite, no partial merge.
        fs::write(&path, serde_json::to_string_pretty(record)?)?;
        debug!(path = %path.display(), "progress record written");
        Ok(())
    }
}

impl ProgressStore for JsonProgressStore {
    fn load(&self, title: &Title) -> anyhow::Result<ProgressRecord> {
        Ok(self.read(title)?)
    }

    fn save(&self, title: &Title, record: &mut ProgressRecord) -> anyhow::Result<()> {
        Ok(self.write(title, record)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn title_in(dir: &std::path::Path) -> Title {
        let directory = dir.join("Example");
        fs::create_dir(&directory).unwrap();
        Title::new(directory)
    }

    #[test]
    fn first_load_creates_the_sidecar_file() {
        let root = tempdir().unwrap();
        let title = title_in(root.path());
        let store = JsonProgressStore::new();

        let record = store.load(&title).unwrap();
        assert_eq!(record.last_chapter, None);
        assert_eq!(record.last_position, None);
        assert!(JsonProgressStore::metadata_path(&title).exists());
    }

    #[test]
    fn save_and_reload_round_trip() {
        let root = tempdir().unwrap();
        let title = title_in(root.path());
        let store = JsonProgressStore::new();

        let mut record = store.load(&title).unwrap();
        record.set_last_chapter("7.cbz");
        record.set_last_position(420);
        let before = record.last_updated;
        store.save(&title, &mut record).unwrap();
        assert!(record.last_updated >= before);

        let reloaded = store.load(&title).unwrap();
        assert_eq!(reloaded.last_chapter.as_deref(), Some("7.cbz"));
        assert_eq!(reloaded.last_position, Some(420));
    }

    #[test]
    fn corrupt_record_falls_back_to_defaults() {
        let root = tempdir().unwrap();
        let title = title_in(root.path());
        fs::write(JsonProgressStore::metadata_path(&title), "{ not json").unwrap();

        let store = JsonProgressStore::new();
        let record = store.load(&title).unwrap();
        assert_eq!(record.last_chapter, None);
        assert_eq!(record.last_position, None);
    }
}
