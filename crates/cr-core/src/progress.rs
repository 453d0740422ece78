//! Per-title reading progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::library::{Chapter, Title};

/// The persisted progress for one title: the chapter the reader last
/// opened and the scroll offset inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub last_chapter: Option<String>,
    pub last_position: Option<i32>,
    pub last_updated: DateTime<Utc>,
}

impl ProgressRecord {
    /// The record a title starts with before anything was read.
    pub fn empty() -> Self {
        Self {
            last_chapter: None,
            last_position: None,
            last_updated: Utc::now(),
        }
    }

    pub fn set_last_chapter(&mut self, file_name: &str) {
        self.last_chapter = Some(file_name.to_string());
    }

    pub fn set_last_position(&mut self, position: i32) {
        self.last_position = Some(position);
    }

    /// Index to resume at in a freshly listed chapter sequence.
    ///
    /// Falls back to the first chapter when the recorded chapter no
    /// longer matches any entry (renamed or removed archive).
    pub fn resume_index(&self, chapters: &[Chapter]) -> usize {
        self.last_chapter
            .as_deref()
            .and_then(|last| chapters.iter().position(|c| c.file_name == last))
            .unwrap_or(0)
    }
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self::empty()
    }
}

/// Storage for [`ProgressRecord`]s, implemented by the data layer.
///
/// `save` stamps `last_updated` and rewrites the whole record; the
/// setters on the record itself never persist. The engine decides when
/// a save happens.
pub trait ProgressStore: Send + Sync {
    fn load(&self, title: &Title) -> anyhow::Result<ProgressRecord>;
    fn save(&self, title: &Title, record: &mut ProgressRecord) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapters(names: &[&str]) -> Vec<Chapter> {
        names
            .iter()
            .map(|n| Chapter::from_file_name(n).unwrap())
            .collect()
    }

    #[test]
    fn resume_index_matches_recorded_chapter() {
        let list = chapters(&["1.cbz", "2.cbz", "3.cbz"]);
        let mut record = ProgressRecord::empty();
        record.set_last_chapter("2.cbz");
        assert_eq!(record.resume_index(&list), 1);
    }

    #[test]
    fn resume_index_falls_back_to_start_when_chapter_is_gone() {
        let list = chapters(&["1.cbz", "2.cbz"]);
        let mut record = ProgressRecord::empty();
        record.set_last_chapter("renamed away.cbz");
        assert_eq!(record.resume_index(&list), 0);
    }

    #[test]
    fn fresh_record_resumes_at_start() {
        let list = chapters(&["1.cbz", "2.cbz"]);
        assert_eq!(ProgressRecord::empty().resume_index(&list), 0);
    }
}
