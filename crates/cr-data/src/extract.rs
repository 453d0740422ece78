//! Chapter archive extraction into a scratch directory.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::ZipArchive;

use cr_core::assets::ChapterAssetExtractor;

use crate::DataError;

/// Page image entries the extractor keeps; everything else in the
/// archive is ignored.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "webm"];

/// Extracts `.cbz` archives with the `zip` crate, materializing pages
/// under `<scratch_root>/<archive-stem>/`.
///
/// Extraction is idempotent: re-extracting the same archive overwrites
/// the same files and returns the same ordered list.
#[derive(Debug, Clone)]
pub struct ZipExtractor {
    scratch_root: PathBuf,
}

impl ZipExtractor {
    pub fn new(scratch_root: PathBuf) -> Self {
        Self { scratch_root }
    }

    /// Remove everything extracted so far (called on shutdown).
    pub fn clear_scratch(&self) -> io::Result<()> {
        if self.scratch_root.exists() {
            fs::remove_dir_all(&self.scratch_root)?;
            info!(path = %self.scratch_root.display(), "scratch directory cleared");
        }
        Ok(())
    }

    fn extract_pages(&self, archive_path: &Path) -> Result<Vec<PathBuf>, DataError> {
        let file = File::open(archive_path).map_err(|e| DataError::ArchiveRead {
            path: archive_path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| DataError::ArchiveRead {
                path: archive_path.to_path_buf(),
                message: e.to_string(),
            })?;

        let stem = archive_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("chapter");
        let out_dir = self.scratch_root.join(stem);
        fs::create_dir_all(&out_dir)?;

        let mut pages = Vec::new();
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            if !entry.is_file() {
                continue;
            }
            // Guards against paths escaping the scratch directory.
            let Some(relative) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
                continue;
            };
            let Some(extension) = relative
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase())
            else {
                continue;
            };
            if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
                continue;
            }

            let destination = out_dir.join(&relative);
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut output = File::create(&destination)?;
            io::copy(&mut entry, &mut output)?;
            pages.push(destination);
        }

        debug!(
            archive = %archive_path.display(),
            pages = pages.len(),
            "chapter extracted"
        );
        Ok(pages)
    }
}

impl ChapterAssetExtractor for ZipExtractor {
    fn extract(&self, archive: &Path) -> anyhow::Result<Vec<PathBuf>> {
        Ok(self.extract_pages(archive)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        for (name, body) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(body).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn extracts_images_in_archive_order() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("1.cbz");
        write_archive(
            &archive,
            &[
                ("001.png", b"a"),
                ("002.jpg", b"b"),
                ("info.txt", b"not a page"),
                ("003.webp", b"c"),
            ],
        );

        let extractor = ZipExtractor::new(dir.path().join("scratch"));
        let pages = extractor.extract(&archive).unwrap();
        let names: Vec<String> = pages
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["001.png", "002.jpg", "003.webp"]);
        assert!(pages.iter().all(|p| p.exists()));
    }

    #[test]
    fn re_extraction_is_idempotent() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("1.cbz");
        write_archive(&archive, &[("001.png", b"a")]);

        let extractor = ZipExtractor::new(dir.path().join("scratch"));
        let first = extractor.extract(&archive).unwrap();
        let second = extractor.extract(&archive).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_archive_is_a_read_error() {
        let dir = tempdir().unwrap();
        let extractor = ZipExtractor::new(dir.path().join("scratch"));
        assert!(extractor.extract(&dir.path().join("absent.cbz")).is_err());
    }

    #[test]
    fn clear_scratch_removes_extracted_pages() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("1.cbz");
        write_archive(&archive, &[("001.png", b"a")]);

        let extractor = ZipExtractor::new(dir.path().join("scratch"));
        let pages = extractor.extract(&archive).unwrap();
        extractor.clear_scratch().unwrap();
        assert!(!pages[0].exists());
    }
}
