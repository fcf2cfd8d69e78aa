//! Persisted editor settings.
//!
//! Stored by the host as one small JSON blob with no schema version. Every
//! field has a default, so a blob from an older or newer build still loads;
//! a blob that is not JSON at all is logged and replaced by defaults.

#[cfg(test)]
#[path = "settings_test.rs"]
mod settings_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::MAX_RECENT_FILES;

/// Widths of the side panels and heights of their collapsible sections.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanelSettings {
    pub left_panel_width: Option<f64>,
    pub right_panel_width: Option<f64>,
    pub section_heights: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// `system`, `light` or `dark`.
    pub theme: String,
    /// Most recent first.
    pub recent_files: Vec<String>,
    pub panel_settings: PanelSettings,
    pub console_height: Option<f64>,
    pub console_visible: bool,
    pub show_score_frames: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: "system".into(),
            recent_files: Vec::new(),
            panel_settings: PanelSettings::default(),
            console_height: None,
            console_visible: true,
            show_score_frames: true,
        }
    }
}

impl Settings {
    /// Parse a stored blob, falling back to defaults if it is malformed.
    #[must_use]
    pub fn from_json(text: &str) -> Self {
        match serde_json::from_str::<Self>(text) {
            Ok(mut settings) => {
                settings.normalize_recent();
                settings
            }
            Err(e) => {
                tracing::warn!(error = %e, "malformed settings; using defaults");
                Self::default()
            }
        }
    }

    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Move `path` to the front of the recent list.
    pub fn add_recent_file(&mut self, path: &str) {
        self.remove_recent_file(path);
        self.recent_files.insert(0, path.to_owned());
        self.recent_files.truncate(MAX_RECENT_FILES);
    }

    /// Paths compare case-insensitively.
    pub fn remove_recent_file(&mut self, path: &str) -> bool {
        let before = self.recent_files.len();
        self.recent_files.retain(|p| !p.eq_ignore_ascii_case(path));
        self.recent_files.len() != before
    }

    pub fn clear_recent_files(&mut self) {
        self.recent_files.clear();
    }

    fn normalize_recent(&mut self) {
        let mut seen: Vec<String> = Vec::new();
        self.recent_files.retain(|p| {
            let key = p.to_ascii_lowercase();
            if p.is_empty() || seen.contains(&key) {
                return false;
            }
            seen.push(key);
            true
        });
        self.recent_files.truncate(MAX_RECENT_FILES);
    }
}
