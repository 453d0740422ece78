//! Library catalog: title listing and chapter ordering.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use cr_core::library::{Chapter, Title};

use crate::DataError;

/// Chapter archives are flat zip files of page images.
pub const ARCHIVE_EXTENSION: &str = "cbz";

/// List the titles under the library root: subdirectories only, hidden
/// entries excluded, sorted by display name.
pub fn list_titles(library_root: &Path) -> Result<Vec<Title>, DataError> {
    if !library_root.is_dir() {
        return Err(DataError::MissingLibraryRoot(library_root.to_path_buf()));
    }

    let mut titles = Vec::new();
    for entry in fs::read_dir(library_root)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') || !path.is_dir() {
            continue;
        }
        titles.push(Title::new(path));
    }
    titles.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(root = %library_root.display(), count = titles.len(), "listed titles");
    Ok(titles)
}

/// List the chapters of a title in reading order.
///
/// Entries whose name carries no digit run are dropped with a warning
/// rather than failing the whole listing. The order is recomputed from
/// the directory on every call.
pub fn list_chapters(title: &Title) -> Result<Vec<Chapter>, DataError> {
    let mut names = Vec::new();
    for entry in fs::read_dir(&title.directory)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(ARCHIVE_EXTENSION) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }
    // Directory listing order is filesystem-dependent; fix the tie-break
    // order for equal chapter numbers before the stable numeric sort.
    names.sort();

    let mut chapters = Vec::new();
    for name in names {
        match Chapter::from_file_name(&name) {
            Some(chapter) => chapters.push(chapter),
            None => {
                let error = DataError::MalformedChapterName(name);
                warn!(%error, title = %title.name, "dropping chapter entry");
            }
        }
    }

    // Numeric sort on the integral part only ("9" before "10"); half
    // placement is handled by the scan below, not by the sort key.
    chapters.sort_by_key(|c| c.number.integral);
    apply_half_chapter_rule(&mut chapters);

    debug!(title = %title.name, count = chapters.len(), "listed chapters");
    Ok(chapters)
}

/// Half-chapter placement rule.
///
/// Scan left to right with a one-shot toggle. A half-chapter directly
/// followed by an entry with the same integral part moves two positions
/// later, keeping a numbered omake next to its paired chapter instead of
/// strictly between N and N+1. The moved chapter resets the toggle when
/// the scan reaches it again. Deliberately adjacency-based; a stable
/// global sort key would order duplicate-numbered inputs differently.
fn apply_half_chapter_rule(chapters: &mut Vec<Chapter>) {
    let mut skipping_half = false;
    let mut index = 0;
    while index < chapters.len() {
        if chapters[index].is_half() {
            if skipping_half {
                skipping_half = false;
            } else if let Some(next_integral) = chapters.get(index + 1).map(|c| c.number.integral) {
                if next_integral == chapters[index].number.integral {
                    let chapter = chapters.remove(index);
                    let slot = (index + 2).min(chapters.len());
                    chapters.insert(slot, chapter);
                    skipping_half = true;
                }
            }
        }
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    fn names(chapters: &[Chapter]) -> Vec<&str> {
        chapters.iter().map(|c| c.file_name.as_str()).collect()
    }

    fn chapters_from(names: &[&str]) -> Vec<Chapter> {
        names
            .iter()
            .map(|n| Chapter::from_file_name(n).unwrap())
            .collect()
    }

    #[test]
    fn missing_root_is_an_error() {
        let root = tempdir().unwrap();
        let absent = root.path().join("nowhere");
        assert!(matches!(
            list_titles(&absent),
            Err(DataError::MissingLibraryRoot(_))
        ));
    }

    #[test]
    fn titles_are_directories_sorted_by_name() {
        let root = tempdir().unwrap();
        fs::create_dir(root.path().join("Berserk")).unwrap();
        fs::create_dir(root.path().join("Akira")).unwrap();
        fs::create_dir(root.path().join(".hidden")).unwrap();
        touch(root.path(), "stray-file.cbz");

        let titles = list_titles(root.path()).unwrap();
        let listed: Vec<&str> = titles.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(listed, ["Akira", "Berserk"]);
    }

    #[test]
    fn chapters_sort_numerically_not_lexicographically() {
        let root = tempdir().unwrap();
        let dir = root.path().join("Title");
        fs::create_dir(&dir).unwrap();
        for name in ["Chapter 10.cbz", "Chapter 9.cbz", "Chapter 100.cbz"] {
            touch(&dir, name);
        }

        let chapters = list_chapters(&Title::new(dir)).unwrap();
        assert_eq!(
            names(&chapters),
            ["Chapter 9.cbz", "Chapter 10.cbz", "Chapter 100.cbz"]
        );
    }

    #[test]
    fn malformed_names_are_dropped_not_fatal() {
        let root = tempdir().unwrap();
        let dir = root.path().join("Title");
        fs::create_dir(&dir).unwrap();
        for name in ["1.cbz", "omake.cbz", "2.cbz", "notes.txt"] {
            touch(&dir, name);
        }

        let chapters = list_chapters(&Title::new(dir)).unwrap();
        assert_eq!(names(&chapters), ["1.cbz", "2.cbz"]);
    }

    #[test]
    fn plain_half_chapters_stay_between_their_neighbours() {
        let mut chapters = chapters_from(&["1.cbz", "2.5.cbz", "3.cbz"]);
        apply_half_chapter_rule(&mut chapters);
        assert_eq!(names(&chapters), ["1.cbz", "2.5.cbz", "3.cbz"]);
    }

    #[test]
    fn duplicate_integer_half_moves_two_slots_later() {
        // Scan order puts the half first; the following entry shares the
        // integral part, so the half moves exactly two slots later.
        let mut chapters = chapters_from(&["12.5.cbz", "12.cbz", "13.cbz"]);
        apply_half_chapter_rule(&mut chapters);
        assert_eq!(names(&chapters), ["12.cbz", "13.cbz", "12.5.cbz"]);
    }

    #[test]
    fn moved_half_is_not_reordered_again() {
        // After the move the scan revisits the half; the toggle makes
        // that visit a no-op instead of a second shift.
        let mut chapters = chapters_from(&["12.5.cbz", "12.cbz", "13.cbz", "13.5.cbz"]);
        apply_half_chapter_rule(&mut chapters);
        assert_eq!(
            names(&chapters),
            ["12.cbz", "13.cbz", "12.5.cbz", "13.5.cbz"]
        );
    }

    #[test]
    fn each_half_chapter_gets_its_own_shift() {
        let mut chapters = chapters_from(&[
            "12.5.cbz",
            "12.cbz",
            "13.cbz",
            "20.5.cbz",
            "20.cbz",
        ]);
        apply_half_chapter_rule(&mut chapters);
        assert_eq!(
            names(&chapters),
            ["12.cbz", "13.cbz", "12.5.cbz", "20.cbz", "20.5.cbz"]
        );
    }

    #[test]
    fn listing_applies_the_rule_end_to_end() {
        let root = tempdir().unwrap();
        let dir = root.path().join("Title");
        fs::create_dir(&dir).unwrap();
        // "12.5.cbz" sorts before "12.cbz" lexicographically, so the
        // stable numeric sort leaves the half in front of its twin.
        for name in ["12.cbz", "12.5.cbz", "13.cbz"] {
            touch(&dir, name);
        }

        let chapters = list_chapters(&Title::new(dir)).unwrap();
        assert_eq!(names(&chapters), ["12.cbz", "13.cbz", "12.5.cbz"]);
    }
}
