//! Domain model for the library: titles and chapters.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One comic series, backed by a subdirectory of the library root.
///
/// Identity is the directory path; the display name is derived from it
/// once at listing time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    pub name: String,
    pub directory: PathBuf,
}

impl Title {
    pub fn new(directory: PathBuf) -> Self {
        let name = directory
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        Self { name, directory }
    }

    /// Absolute path of a chapter archive inside this title.
    pub fn chapter_path(&self, file_name: &str) -> PathBuf {
        self.directory.join(file_name)
    }
}

/// Chapter number parsed from an archive file name.
///
/// The first run of ASCII digits is the integral part; a `.5` suffix
/// directly before the extension marks a half-chapter (bonus/omake
/// content). Stored as (integral, half) so ordering stays exact without
/// floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterNumber {
    pub integral: u32,
    pub half: bool,
}

impl ChapterNumber {
    /// Parse from a file name. Returns `None` when the name contains no
    /// digit run at all (a malformed chapter name).
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name
            .rsplit_once('.')
            .map(|(stem, _ext)| stem)
            .unwrap_or(file_name);

        let start = file_name.find(|c: char| c.is_ascii_digit())?;
        let digits: String = file_name[start..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        let integral: u32 = digits.parse().ok()?;

        Some(Self {
            integral,
            half: stem.ends_with(".5"),
        })
    }

    /// Total order key: half-chapters sort between their integer and the
    /// next one.
    fn sort_key(&self) -> u64 {
        u64::from(self.integral) * 2 + u64::from(self.half)
    }
}

impl PartialOrd for ChapterNumber {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChapterNumber {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for ChapterNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.half {
            write!(f, "{}.5", self.integral)
        } else {
            write!(f, "{}", self.integral)
        }
    }
}

/// One chapter archive within a title.
///
/// Chapters are unique per title by file name; uniqueness is not
/// otherwise enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub file_name: String,
    pub number: ChapterNumber,
}

impl Chapter {
    /// Build a chapter from its archive file name. `None` when the name
    /// carries no chapter number.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let number = ChapterNumber::parse(file_name)?;
        Some(Self {
            file_name: file_name.to_string(),
            number,
        })
    }

    pub fn is_half(&self) -> bool {
        self.number.half
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_chapter_numbers() {
        let n = ChapterNumber::parse("Chapter 12.cbz").unwrap();
        assert_eq!(n.integral, 12);
        assert!(!n.half);
    }

    #[test]
    fn parses_half_chapters() {
        let n = ChapterNumber::parse("Chapter 12.5.cbz").unwrap();
        assert_eq!(n.integral, 12);
        assert!(n.half);
        assert_eq!(n.to_string(), "12.5");
    }

    #[test]
    fn first_digit_run_wins() {
        // Trailing volume markers must not override the chapter number.
        let n = ChapterNumber::parse("Ch 9 (v2).cbz").unwrap();
        assert_eq!(n.integral, 9);
    }

    #[test]
    fn no_digits_is_malformed() {
        assert!(ChapterNumber::parse("bonus.cbz").is_none());
    }

    #[test]
    fn numeric_order_beats_lexicographic() {
        let nine = ChapterNumber::parse("9.cbz").unwrap();
        let ten = ChapterNumber::parse("10.cbz").unwrap();
        assert!(nine < ten);
    }

    #[test]
    fn half_sorts_between_integers() {
        let twelve = ChapterNumber::parse("12.cbz").unwrap();
        let half = ChapterNumber::parse("12.5.cbz").unwrap();
        let thirteen = ChapterNumber::parse("13.cbz").unwrap();
        assert!(twelve < half);
        assert!(half < thirteen);
    }

    #[test]
    fn title_name_from_directory() {
        let title = Title::new(PathBuf::from("/library/One Piece"));
        assert_eq!(title.name, "One Piece");
        assert_eq!(
            title.chapter_path("1.cbz"),
            PathBuf::from("/library/One Piece/1.cbz")
        );
    }
}
