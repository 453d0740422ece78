//! The persisted settings document.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use cr_core::navigation::{StepTiming, Tuning};

use crate::DataError;

/// Scroll direction the mouse zones map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewerSettings {
    pub width: i32,
    pub ui_scale: f32,
}

/// Process-wide read-mostly configuration. Loaded once at session
/// start; the engine only ever writes back `last_read_title`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scroll: StepTiming,
    pub click: StepTiming,
    pub page: StepTiming,
    pub mouse: StepTiming,
    pub viewer: ViewerSettings,
    pub orientation: Orientation,
    pub library_root: PathBuf,
    pub last_read_title: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scroll: StepTiming {
                step: 100,
                duration: 100,
            },
            click: StepTiming {
                step: 500,
                duration: 400,
            },
            page: StepTiming {
                step: 500,
                duration: 400,
            },
            mouse: StepTiming {
                step: 10,
                duration: 10,
            },
            viewer: ViewerSettings {
                width: 800,
                ui_scale: 1.0,
            },
            orientation: Orientation::Horizontal,
            library_root: dirs::home_dir().unwrap_or_default().join("Mangas"),
            last_read_title: None,
        }
    }
}

impl Settings {
    /// The tuning slice the navigation engine reads.
    pub fn tuning(&self) -> Tuning {
        Tuning {
            scroll: self.scroll,
            page: self.page,
            viewer_width: self.viewer.width,
            ui_scale: self.viewer.ui_scale,
            ..Tuning::default()
        }
    }
}

/// Settings document bound to its file path.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    pub settings: Settings,
}

impl SettingsStore {
    /// Load the document, materializing defaults on first run.
    pub fn load(path: &Path) -> Result<Self, DataError> {
        if !path.exists() {
            let store = Self {
                path: path.to_path_buf(),
                settings: Settings::default(),
            };
            store.save()?;
            info!(path = %path.display(), "created default settings");
            return Ok(store);
        }
        let raw = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), "settings loaded");
        Ok(Self {
            path: path.to_path_buf(),
            settings,
        })
    }

    pub fn save(&self) -> Result<(), DataError> {
        fs::write(&self.path, serde_json::to_string_pretty(&self.settings)?)?;
        Ok(())
    }

    /// Remember the last opened title. This is the legacy single-key
    /// setter: it saves immediately, unlike the engine's explicit
    /// progress saves.
    pub fn set_last_read_title(&mut self, title: Option<String>) -> Result<(), DataError> {
        self.settings.last_read_title = title;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn first_run_materializes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("comicreader.json");

        let store = SettingsStore::load(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.settings.scroll.step, 100);
        assert_eq!(store.settings.page.duration, 400);
        assert_eq!(store.settings.orientation, Orientation::Horizontal);
        assert_eq!(store.settings.last_read_title, None);
    }

    #[test]
    fn last_read_title_saves_immediately() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("comicreader.json");

        let mut store = SettingsStore::load(&path).unwrap();
        store
            .set_last_read_title(Some("Berserk".to_string()))
            .unwrap();

        let reloaded = SettingsStore::load(&path).unwrap();
        assert_eq!(reloaded.settings.last_read_title.as_deref(), Some("Berserk"));
    }

    #[test]
    fn partial_documents_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("comicreader.json");
        fs::write(&path, r#"{ "viewer": { "width": 1200, "ui_scale": 2.0 } }"#).unwrap();

        let store = SettingsStore::load(&path).unwrap();
        assert_eq!(store.settings.viewer.width, 1200);
        // Unspecified keys keep their defaults.
        assert_eq!(store.settings.scroll.step, 100);
    }

    #[test]
    fn tuning_projects_the_engine_slice() {
        let settings = Settings {
            viewer: ViewerSettings {
                width: 1000,
                ui_scale: 1.5,
            },
            ..Settings::default()
        };
        let tuning = settings.tuning();
        assert_eq!(tuning.viewer_width, 1000);
        assert_eq!(tuning.scaled(100), 150);
        assert_eq!(tuning.debounce, 1000);
    }
}
