use crate::history::{BuildHistory, HistoryStore};
use crate::pipeline::{BuildOptions, BuildPipeline, PipelineError, PipelineOutcome};
use crate::settings::BuildSettings;
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<BuildPipeline>,
    history: Arc<HistoryStore>,
    settings: Arc<RwLock<BuildSettings>>,
    settings_path: PathBuf,
    /// Exactly one build in flight; concurrent triggers are rejected, not
    /// queued.
    build_gate: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        pipeline: Arc<BuildPipeline>,
        history: Arc<HistoryStore>,
        settings: BuildSettings,
        settings_path: PathBuf,
    ) -> Self {
        Self {
            pipeline,
            history,
            settings: Arc::new(RwLock::new(settings)),
            settings_path,
            build_gate: Arc::new(Mutex::new(())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BuildParams {
    /// Manual build name; automatic naming when absent.
    name: Option<String>,
    /// Target platform tag; the configured default when absent.
    platform: Option<String>,
}

#[derive(Debug, Serialize)]
struct BuildResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    build: Option<PipelineOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl BuildResponse {
    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            build: None,
            error: Some(message.into()),
        }
    }
}

async fn build_handler(
    State(state): State<AppState>,
    Query(params): Query<BuildParams>,
) -> Result<Json<BuildResponse>, (StatusCode, Json<BuildResponse>)> {
    let platform = match params.platform.as_deref() {
        Some(tag) => Some(
            tag.parse()
                .map_err(|err: String| (StatusCode::BAD_REQUEST, Json(BuildResponse::error(err))))?,
        ),
        None => None,
    };

    let Ok(_guard) = state.build_gate.try_lock() else {
        return Err((
            StatusCode::CONFLICT,
            Json(BuildResponse::error("a build is already in flight")),
        ));
    };

    let opts = BuildOptions {
        manual_name: params.name,
        platform,
    };
    let settings = state.settings.read().clone();

    info!(
        "build request: platform={:?} manual_name={:?}",
        opts.platform, opts.manual_name
    );

    match state.pipeline.run(&settings, &opts).await {
        Ok(outcome) => Ok(Json(BuildResponse {
            status: outcome.status.to_string().to_lowercase(),
            build: Some(outcome),
            error: None,
        })),
        Err(PipelineError::NoScenes) => Err((
            StatusCode::BAD_REQUEST,
            Json(BuildResponse::error(PipelineError::NoScenes.to_string())),
        )),
        Err(err) => {
            error!("build failed: {}", err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(BuildResponse::error(format!("build failed: {}", err))),
            ))
        }
    }
}

async fn history_handler(State(state): State<AppState>) -> Json<BuildHistory> {
    Json(state.history.snapshot())
}

#[derive(Debug, Deserialize)]
struct ExportParams {
    path: String,
}

async fn export_history_handler(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<BuildResponse>)> {
    let dest = PathBuf::from(&params.path);
    match state.history.export(&dest) {
        Ok(()) => Ok(Json(serde_json::json!({
            "status": "exported",
            "path": params.path,
        }))),
        Err(err) => {
            error!("history export failed: {}", err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(BuildResponse::error(format!("export failed: {}", err))),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClearParams {
    #[serde(default)]
    confirm: bool,
}

async fn clear_history_handler(
    State(state): State<AppState>,
    Query(params): Query<ClearParams>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<BuildResponse>)> {
    if !params.confirm {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(BuildResponse::error("history clear requires confirm=true")),
        ));
    }

    match state.history.clear() {
        Ok(()) => Ok(Json(serde_json::json!({ "status": "cleared" }))),
        Err(err) => {
            error!("history clear failed: {}", err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(BuildResponse::error(format!("clear failed: {}", err))),
            ))
        }
    }
}

async fn get_settings_handler(State(state): State<AppState>) -> Json<BuildSettings> {
    Json(state.settings.read().clone())
}

async fn put_settings_handler(
    State(state): State<AppState>,
    Json(settings): Json<BuildSettings>,
) -> Result<Json<BuildSettings>, (StatusCode, Json<BuildResponse>)> {
    if let Err(err) = settings.save(&state.settings_path) {
        error!("failed to persist settings: {}", err);
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(BuildResponse::error(format!(
                "settings save failed: {}",
                err
            ))),
        ));
    }
    *state.settings.write() = settings.clone();
    Ok(Json(settings))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "unity-build-runner",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/build", post(build_handler))
        .route("/history", get(history_handler).delete(clear_history_handler))
        .route("/history/export", post(export_history_handler))
        .route(
            "/settings",
            get(get_settings_handler).put(put_settings_handler),
        )
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
        .with_state(state)
}

pub async fn run_server(state: AppState, port: u16) -> Result<()> {
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
