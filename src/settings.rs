use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// User-tweakable build preferences, persisted as a single JSON blob and
/// round-tripped through the settings endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Overrides `<builds_root>/<target>` as the base folder when set.
    pub custom_output_path: Option<PathBuf>,
    pub create_zip: bool,
    pub generate_logs: bool,
    /// Off by default; heavy-files reporting is implemented but not yet
    /// surfaced as a stable toggle.
    pub generate_heavy_files_log: bool,
    pub generate_unity_log: bool,
    pub generate_build_log: bool,
    pub suppress_delete_confirm: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            custom_output_path: None,
            create_zip: true,
            generate_logs: false,
            generate_heavy_files_log: false,
            generate_unity_log: false,
            generate_build_log: false,
            suppress_delete_confirm: false,
        }
    }
}

impl BuildSettings {
    /// Missing or unreadable settings fall back to defaults.
    pub fn load(path: &Path) -> Self {
        match fs::read(path) {
            Ok(raw) if !raw.is_empty() => match serde_json::from_slice(&raw) {
                Ok(settings) => settings,
                Err(err) => {
                    warn!("unreadable settings blob {}: {}", path.display(), err);
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
