#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use unity_build_runner::config::{
    EngineConfig, OutputConfig, ProjectConfig, RunnerConfig, SceneConfig, ServerConfig,
};
use unity_build_runner::core::{BuildStatus, EngineReport, TargetPlatform};
use unity_build_runner::engine::{BuildEngine, BuildSpec};
use unity_build_runner::history::HistoryStore;
use unity_build_runner::pipeline::BuildPipeline;

/// Engine double that returns a scripted report and optionally drops a
/// dummy artifact at the requested output path.
pub struct MockEngine {
    pub report: EngineReport,
    pub artifact_bytes: usize,
    pub calls: AtomicUsize,
    pub delay: Duration,
}

impl MockEngine {
    pub fn new(report: EngineReport) -> Self {
        Self {
            report,
            artifact_bytes: 0,
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn with_artifact(mut self, bytes: usize) -> Self {
        self.artifact_bytes = bytes;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BuildEngine for MockEngine {
    async fn build(&self, spec: &BuildSpec) -> Result<EngineReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.artifact_bytes > 0 && self.report.status == BuildStatus::Succeeded {
            fs::write(&spec.output_path, vec![0u8; self.artifact_bytes])?;
        }
        Ok(self.report.clone())
    }
}

/// Engine double whose invocation itself fails, as if the binary were
/// missing.
pub struct BrokenEngine;

#[async_trait]
impl BuildEngine for BrokenEngine {
    async fn build(&self, _spec: &BuildSpec) -> Result<EngineReport> {
        Err(anyhow!("editor binary not found"))
    }
}

pub fn success_report(total_size: u64) -> EngineReport {
    EngineReport {
        status: BuildStatus::Succeeded,
        total_seconds: 12.5,
        total_size,
        total_errors: 0,
        total_warnings: 1,
        files: Vec::new(),
    }
}

pub fn failed_report(errors: u32, warnings: u32) -> EngineReport {
    EngineReport {
        status: BuildStatus::Failed,
        total_seconds: 3.0,
        total_size: 0,
        total_errors: errors,
        total_warnings: warnings,
        files: Vec::new(),
    }
}

pub fn test_config(dir: &Path) -> RunnerConfig {
    RunnerConfig {
        project: ProjectConfig {
            name: "MyGame".to_string(),
            path: dir.join("project"),
        },
        engine: EngineConfig {
            binary: PathBuf::from("/usr/bin/true"),
            build_method: "BuildCommand.PerformBuild".to_string(),
            log_file: Some(dir.join("Editor.log")),
        },
        output: OutputConfig {
            builds_root: dir.join("Builds"),
            target: TargetPlatform::StandaloneWindows64,
            state_dir: dir.join("state"),
        },
        server: ServerConfig::default(),
        scenes: vec![SceneConfig {
            path: "Assets/Scenes/Main.unity".to_string(),
            enabled: true,
        }],
    }
}

pub fn make_pipeline(
    dir: &Path,
    engine: Arc<dyn BuildEngine>,
) -> (Arc<BuildPipeline>, Arc<HistoryStore>) {
    let config = test_config(dir);
    fs::create_dir_all(&config.output.state_dir).unwrap();
    let history = Arc::new(HistoryStore::open(config.history_path()));
    let pipeline = Arc::new(BuildPipeline::new(config, engine, history.clone()));
    (pipeline, history)
}
