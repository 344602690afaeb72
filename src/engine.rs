use crate::core::{BuildStatus, EngineReport, OutputFile, TargetPlatform};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info};
use walkdir::WalkDir;

/// What one engine invocation needs: the enabled scenes, where the player
/// artifact goes, and the target.
#[derive(Debug, Clone)]
pub struct BuildSpec {
    pub scenes: Vec<String>,
    pub output_path: PathBuf,
    pub platform: TargetPlatform,
}

/// The engine seam. `Err` means the engine could not be invoked at all; a
/// build that ran and failed comes back as a normal report with `Failed`
/// status.
#[async_trait]
pub trait BuildEngine: Send + Sync {
    async fn build(&self, spec: &BuildSpec) -> Result<EngineReport>;
}

/// Drives the editor binary in batch mode as an external process. Scenes
/// and output path travel through environment variables consumed by the
/// configured build method inside the project.
pub struct ProcessEngine {
    editor_binary: PathBuf,
    project_path: PathBuf,
    build_method: String,
    log_file: PathBuf,
}

impl ProcessEngine {
    pub fn new(
        editor_binary: PathBuf,
        project_path: PathBuf,
        build_method: String,
        log_file: PathBuf,
    ) -> Self {
        Self {
            editor_binary,
            project_path,
            build_method,
            log_file,
        }
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }
}

#[async_trait]
impl BuildEngine for ProcessEngine {
    async fn build(&self, spec: &BuildSpec) -> Result<EngineReport> {
        info!(
            "invoking editor for {} -> {}",
            spec.platform,
            spec.output_path.display()
        );

        let started = Instant::now();
        let output = Command::new(&self.editor_binary)
            .arg("-batchmode")
            .arg("-nographics")
            .arg("-quit")
            .arg("-projectPath")
            .arg(&self.project_path)
            .arg("-buildTarget")
            .arg(spec.platform.tag())
            .arg("-logFile")
            .arg(&self.log_file)
            .arg("-executeMethod")
            .arg(&self.build_method)
            .env("UBR_BUILD_OUTPUT", &spec.output_path)
            .env("UBR_BUILD_SCENES", spec.scenes.join(";"))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| {
                format!(
                    "failed to launch editor binary {}",
                    self.editor_binary.display()
                )
            })?;

        let total_seconds = started.elapsed().as_secs_f64();
        let status = if output.status.success() {
            BuildStatus::Succeeded
        } else {
            BuildStatus::Failed
        };

        let diagnostics = std::fs::read_to_string(&self.log_file).unwrap_or_else(|_| {
            // No run log; fall back to whatever the process printed.
            format!(
                "{}{}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            )
        });
        let (total_errors, total_warnings) = count_diagnostics(&diagnostics);

        let files = if status == BuildStatus::Succeeded {
            collect_output_files(&spec.output_path)
        } else {
            Vec::new()
        };
        let total_size = files.iter().map(|f| f.size).sum();
        debug!(
            "editor exited with {:?}, {} output files, {} bytes",
            output.status.code(),
            files.len(),
            total_size
        );

        Ok(EngineReport {
            status,
            total_seconds,
            total_size,
            total_errors,
            total_warnings,
            files,
        })
    }
}

fn count_diagnostics(text: &str) -> (u32, u32) {
    let mut errors = 0;
    let mut warnings = 0;
    for line in text.lines() {
        let t = line.trim_start();
        if t.contains("error CS") || t.starts_with("Error") {
            errors += 1;
        } else if t.contains("warning CS") || t.starts_with("Warning") {
            warnings += 1;
        }
    }
    (errors, warnings)
}

/// The artifact path may be a single file (`.exe`, `.apk`) whose sibling
/// data folders also belong to the build, so sizes come from walking the
/// containing directory.
fn collect_output_files(output_path: &Path) -> Vec<OutputFile> {
    let root = if output_path.is_dir() {
        output_path
    } else {
        output_path.parent().unwrap_or(output_path)
    };

    let mut files = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(meta) = entry.metadata() {
            files.push(OutputFile {
                path: entry.path().to_path_buf(),
                size: meta.len(),
            });
        }
    }
    files
}
