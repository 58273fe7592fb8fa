use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use htmlpad_core::{DocumentOptions, FoldOptions, IndentPolicy};

const PREFERENCES_VERSION: u32 = 1;
const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("failed to read preferences {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse preferences {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize preferences {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write preferences {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to prepare directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub editor: EditorPreferences,
    #[serde(default)]
    pub logging: LoggingPreferences,
}

fn default_version() -> u32 {
    PREFERENCES_VERSION
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: PREFERENCES_VERSION,
            editor: EditorPreferences::default(),
            logging: LoggingPreferences::default(),
        }
    }
}

impl Preferences {
    pub fn sanitize(&mut self) {
        if self.version == 0 {
            self.version = PREFERENCES_VERSION;
        }
        self.editor.sanitize();
        self.logging.sanitize();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorPreferences {
    #[serde(default = "default_indent_unit")]
    pub indent_unit: usize,
    /// `0` counts a tab as a single indentation unit.
    #[serde(default)]
    pub tab_width: usize,
    #[serde(default = "default_rescan_debounce")]
    pub rescan_debounce_ms: u64,
    #[serde(default = "default_true")]
    pub fold_markup_tags: bool,
}

fn default_true() -> bool {
    true
}

fn default_indent_unit() -> usize {
    4
}

fn default_rescan_debounce() -> u64 {
    300
}

impl Default for EditorPreferences {
    fn default() -> Self {
        Self {
            indent_unit: default_indent_unit(),
            tab_width: 0,
            rescan_debounce_ms: default_rescan_debounce(),
            fold_markup_tags: true,
        }
    }
}

impl EditorPreferences {
    fn sanitize(&mut self) {
        if self.indent_unit == 0 {
            self.indent_unit = default_indent_unit();
        }
        self.indent_unit = self.indent_unit.clamp(1, 16);
        self.tab_width = self.tab_width.min(16);
        self.rescan_debounce_ms = self.rescan_debounce_ms.clamp(50, 5000);
    }

    pub fn fold_options(&self) -> FoldOptions {
        FoldOptions {
            indent: IndentPolicy::from_tab_width(self.tab_width),
            indent_unit: self.indent_unit,
            markup_openers: self.fold_markup_tags,
        }
    }

    pub fn rescan_delay(&self) -> Duration {
        Duration::from_millis(self.rescan_debounce_ms)
    }

    pub fn document_options(&self) -> DocumentOptions {
        DocumentOptions {
            folding: self.fold_options(),
            rescan_delay: self.rescan_delay(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingPreferences {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingPreferences {
    fn sanitize(&mut self) {
        let level = self.level.trim().to_ascii_lowercase();
        self.level = if LOG_LEVELS.contains(&level.as_str()) {
            level
        } else {
            default_log_level()
        };
    }
}

#[derive(Debug)]
pub struct PreferencesStore {
    path: PathBuf,
    data: Preferences,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>, preferences: Preferences) -> Self {
        Self {
            path: path.into(),
            data: preferences,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PreferencesError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            let mut data = Preferences::default();
            data.sanitize();
            return Ok(Self { path, data });
        }

        let contents = fs::read_to_string(&path).map_err(|source| PreferencesError::Read {
            path: path.clone(),
            source,
        })?;
        let mut data: Preferences =
            serde_json::from_str(&contents).map_err(|source| PreferencesError::Parse {
                path: path.clone(),
                source,
            })?;
        data.sanitize();
        Ok(Self { path, data })
    }

    pub fn preferences(&self) -> &Preferences {
        &self.data
    }

    pub fn update<F>(&mut self, mut op: F) -> Result<(), PreferencesError>
    where
        F: FnMut(&mut Preferences),
    {
        op(&mut self.data);
        self.data.sanitize();
        self.save()
    }

    pub fn overwrite(&mut self, preferences: Preferences) -> Result<(), PreferencesError> {
        self.data = preferences;
        self.data.sanitize();
        self.save()
    }

    pub fn save(&self) -> Result<(), PreferencesError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| PreferencesError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let payload = serde_json::to_string_pretty(&self.data).map_err(|source| {
            PreferencesError::Serialize {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, payload.as_bytes()).map_err(|source| PreferencesError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| PreferencesError::Write {
            path: self.path.clone(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_clamps_editor_values() {
        let mut prefs = Preferences {
            version: 0,
            editor: EditorPreferences {
                indent_unit: 0,
                tab_width: 99,
                rescan_debounce_ms: 1,
                fold_markup_tags: false,
            },
            logging: LoggingPreferences {
                level: " DEBUG ".to_string(),
            },
        };
        prefs.sanitize();
        assert_eq!(prefs.version, PREFERENCES_VERSION);
        assert_eq!(prefs.editor.indent_unit, 4);
        assert_eq!(prefs.editor.tab_width, 16);
        assert_eq!(prefs.editor.rescan_debounce_ms, 50);
        assert_eq!(prefs.logging.level, "debug");
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let mut logging = LoggingPreferences {
            level: "verbose".to_string(),
        };
        logging.sanitize();
        assert_eq!(logging.level, "info");
    }

    #[test]
    fn editor_preferences_map_to_document_options() {
        let editor = EditorPreferences {
            indent_unit: 2,
            tab_width: 8,
            rescan_debounce_ms: 450,
            fold_markup_tags: false,
        };
        let options = editor.document_options();
        assert_eq!(options.folding.indent_unit, 2);
        assert_eq!(
            options.folding.indent,
            IndentPolicy::Columns { tab_width: 8 }
        );
        assert!(!options.folding.markup_openers);
        assert_eq!(options.rescan_delay, Duration::from_millis(450));
    }
}
