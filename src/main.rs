use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use unity_build_runner::config::RunnerConfig;
use unity_build_runner::engine::ProcessEngine;
use unity_build_runner::history::HistoryStore;
use unity_build_runner::pipeline::BuildPipeline;
use unity_build_runner::server::{run_server, AppState};
use unity_build_runner::settings::BuildSettings;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting Unity Build Runner");

    let config_path = env::var("UBR_CONFIG").unwrap_or_else(|_| "runner.toml".to_string());
    let config = RunnerConfig::from_file(&PathBuf::from(&config_path))?;

    fs::create_dir_all(&config.output.state_dir)
        .with_context(|| format!("cannot create state dir {}", config.output.state_dir.display()))?;

    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(config.server.port);

    let history = Arc::new(HistoryStore::open(config.history_path()));
    let settings_path = config.settings_path();
    let settings = BuildSettings::load(&settings_path);
    let engine = Arc::new(ProcessEngine::new(
        config.engine.binary.clone(),
        config.project.path.clone(),
        config.engine.build_method.clone(),
        config.engine_log_file(),
    ));
    let pipeline = Arc::new(BuildPipeline::new(config, engine, history.clone()));

    let state = AppState::new(pipeline, history, settings, settings_path);
    run_server(state, port).await?;

    Ok(())
}
