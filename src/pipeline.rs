use crate::archive;
use crate::config::RunnerConfig;
use crate::core::{BuildStatus, TargetPlatform, BYTES_PER_MB, TIMESTAMP_FORMAT};
use crate::engine::{BuildEngine, BuildSpec};
use crate::history::{BuildRecord, HistoryStore};
use crate::naming;
use crate::reports;
use crate::settings::BuildSettings;
use chrono::Local;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no scenes enabled for build")]
    NoScenes,
    #[error("build engine invocation failed: {0}")]
    Engine(#[source] anyhow::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to create zip archive: {0}")]
    Archive(#[source] anyhow::Error),
    #[error("failed to persist history: {0}")]
    History(#[source] anyhow::Error),
}

/// Per-request overrides on top of the static config and the persisted
/// settings. The manual name is threaded through explicitly; the resolver
/// never reads ambient state.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub manual_name: Option<String>,
    pub platform: Option<TargetPlatform>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub record_id: Uuid,
    pub status: BuildStatus,
    pub platform: TargetPlatform,
    pub build_name: String,
    pub build_root: PathBuf,
    pub build_path: PathBuf,
    pub build_size_mb: f64,
    pub zip_size_mb: f64,
    pub build_time_sec: f64,
    pub total_errors: u32,
    pub total_warnings: u32,
    pub logs_generated: bool,
}

/// Sequences one build attempt: resolve name, invoke the engine, derive
/// reports, zip, append history. Linear, not reentrant; the serving layer
/// guarantees a single build in flight.
pub struct BuildPipeline {
    config: RunnerConfig,
    engine: Arc<dyn BuildEngine>,
    history: Arc<HistoryStore>,
}

impl BuildPipeline {
    pub fn new(config: RunnerConfig, engine: Arc<dyn BuildEngine>, history: Arc<HistoryStore>) -> Self {
        Self {
            config,
            engine,
            history,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub async fn run(
        &self,
        settings: &BuildSettings,
        opts: &BuildOptions,
    ) -> Result<PipelineOutcome, PipelineError> {
        let scenes = self.config.enabled_scenes();
        if scenes.is_empty() {
            return Err(PipelineError::NoScenes);
        }

        // Re-resolve on every entry; target, name and root may all have
        // changed since the last attempt.
        let platform = opts.platform.unwrap_or(self.config.output.target);
        let identity = naming::resolve(
            &self.config.project.name,
            platform,
            opts.manual_name.as_deref(),
            settings.custom_output_path.as_deref(),
            &self.config.output.builds_root,
            Local::now().date_naive(),
        )?;

        fs::create_dir_all(&identity.build_root)?;
        fs::create_dir_all(&identity.build_output)?;

        let spec = BuildSpec {
            scenes,
            output_path: identity.build_path.clone(),
            platform,
        };
        let clock = Instant::now();
        let report = self
            .engine
            .build(&spec)
            .await
            .map_err(PipelineError::Engine)?;
        let measured = clock.elapsed().as_secs_f64();

        // Fixed policy: trust the wall clock for successful builds and the
        // engine's own figure for failed ones.
        let build_time_sec = if report.succeeded() {
            measured
        } else {
            report.total_seconds
        };
        let build_size_mb = report.total_size as f64 / BYTES_PER_MB;
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();

        let mut zip_size_mb = 0.0;
        let mut logs_generated = false;
        let log_override = self.config.engine_log_file();

        let steps: Result<(), PipelineError> = (|| {
            if settings.generate_build_log {
                reports::write_summary(
                    &identity.build_root,
                    &report,
                    &identity.build_name,
                    &identity.project_name,
                    platform,
                    &timestamp,
                )?;
                logs_generated = true;
            }

            if settings.generate_unity_log {
                if !reports::copy_engine_log(
                    &identity.build_root,
                    &identity.build_name,
                    Some(&log_override),
                ) {
                    warn!("engine log unavailable, copy skipped");
                }
                logs_generated = true;
            }

            if settings.generate_heavy_files_log {
                reports::write_heavy_files_log(
                    &report,
                    &self.config.project.path,
                    &identity.build_root,
                    &identity.build_name,
                    reports::DEFAULT_TOP_N,
                    Some(&log_override),
                )?;
                logs_generated = true;
            }

            if report.succeeded() && settings.create_zip {
                let bytes = archive::zip_build_output(&identity.build_root, &identity.build_name)
                    .map_err(PipelineError::Archive)?;
                zip_size_mb = bytes as f64 / BYTES_PER_MB;
            }

            Ok(())
        })();

        // The attempt is recorded even when a report or zip step died,
        // with whatever was captured before the failure.
        let record = BuildRecord::new(
            timestamp,
            identity.build_name.clone(),
            build_size_mb,
            zip_size_mb,
            build_time_sec,
            logs_generated,
            report.succeeded(),
        );
        let record_id = record.id;
        self.history.append(record);
        self.history.save().map_err(PipelineError::History)?;

        steps?;

        info!(
            "build {} finished: {} ({} errors, {} warnings), output at {}",
            identity.build_name,
            report.status,
            report.total_errors,
            report.total_warnings,
            identity.build_root.display()
        );

        Ok(PipelineOutcome {
            record_id,
            status: report.status,
            platform,
            build_name: identity.build_name,
            build_root: identity.build_root,
            build_path: identity.build_path,
            build_size_mb,
            zip_size_mb,
            build_time_sec,
            total_errors: report.total_errors,
            total_warnings: report.total_warnings,
            logs_generated,
        })
    }
}
