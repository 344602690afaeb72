use crate::core::TargetPlatform;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Static deployment configuration, read once at startup from a TOML file.
/// User-tweakable toggles live in [`crate::settings::BuildSettings`]
/// instead.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    pub project: ProjectConfig,
    pub engine: EngineConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scenes: Vec<SceneConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// The editor binary invoked in batch mode.
    pub binary: PathBuf,
    #[serde(default = "default_build_method")]
    pub build_method: String,
    /// Where the engine is told to write its run log. Defaults to a file
    /// inside the state dir.
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub builds_root: PathBuf,
    pub target: TargetPlatform,
    /// Holds the history blob, persisted settings and the default engine
    /// log location.
    pub state_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            builds_root: PathBuf::from("Builds"),
            target: TargetPlatform::StandaloneWindows64,
            state_dir: PathBuf::from(".unity-build-runner"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneConfig {
    pub path: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl RunnerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn enabled_scenes(&self) -> Vec<String> {
        self.scenes
            .iter()
            .filter(|s| s.enabled)
            .map(|s| s.path.clone())
            .collect()
    }

    pub fn engine_log_file(&self) -> PathBuf {
        self.engine
            .log_file
            .clone()
            .unwrap_or_else(|| self.output.state_dir.join("Editor.log"))
    }

    pub fn history_path(&self) -> PathBuf {
        self.output.state_dir.join("BuildHistory.json")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.output.state_dir.join("Settings.json")
    }
}

fn default_build_method() -> String {
    "BuildCommand.PerformBuild".to_string()
}

fn enabled_by_default() -> bool {
    true
}
