mod common;

use common::{failed_report, make_pipeline, success_report, BrokenEngine, MockEngine};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use unity_build_runner::core::{BuildStatus, OutputFile, TargetPlatform};
use unity_build_runner::history::HistoryStore;
use unity_build_runner::pipeline::{BuildOptions, BuildPipeline, PipelineError};
use unity_build_runner::settings::BuildSettings;

const MB: u64 = 1_048_576;

fn settings() -> BuildSettings {
    BuildSettings {
        create_zip: false,
        ..BuildSettings::default()
    }
}

#[tokio::test]
async fn failed_build_still_appends_exactly_one_record() {
    let tmp = TempDir::new().unwrap();
    let engine = Arc::new(MockEngine::new(failed_report(2, 5)));
    let (pipeline, history) = make_pipeline(tmp.path(), engine.clone());

    let mut settings = settings();
    settings.create_zip = true;
    let outcome = pipeline
        .run(&settings, &BuildOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.status, BuildStatus::Failed);
    assert_eq!(outcome.total_errors, 2);
    assert_eq!(outcome.total_warnings, 5);
    assert_eq!(outcome.zip_size_mb, 0.0);
    // Failed builds report the engine's own duration, not the wall clock.
    assert_eq!(outcome.build_time_sec, 3.0);

    assert_eq!(history.len(), 1);
    let record = &history.snapshot().records[0];
    assert!(!record.success);
    assert_eq!(record.zip_size_mb, 0.0);
    assert_eq!(record.build_name, outcome.build_name);

    assert!(!outcome
        .build_root
        .join(format!("{}.zip", outcome.build_name))
        .exists());
}

#[tokio::test]
async fn successful_build_zips_output_and_records_sizes() {
    let tmp = TempDir::new().unwrap();
    let engine = Arc::new(MockEngine::new(success_report(3 * MB)).with_artifact(64 * 1024));
    let (pipeline, history) = make_pipeline(tmp.path(), engine);

    let mut settings = settings();
    settings.create_zip = true;
    let outcome = pipeline
        .run(&settings, &BuildOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.status, BuildStatus::Succeeded);
    assert!((outcome.build_size_mb - 3.0).abs() < 1e-9);

    let zip_path = outcome
        .build_root
        .join(format!("{}.zip", outcome.build_name));
    assert!(zip_path.is_file());
    assert!(outcome.zip_size_mb > 0.0);

    let record = &history.snapshot().records[0];
    assert!(record.success);
    assert_eq!(record.zip_size_mb, outcome.zip_size_mb);
    assert_eq!(record.build_size_mb, outcome.build_size_mb);
}

#[tokio::test]
async fn zip_step_respects_the_setting() {
    let tmp = TempDir::new().unwrap();
    let engine = Arc::new(MockEngine::new(success_report(MB)).with_artifact(1024));
    let (pipeline, _history) = make_pipeline(tmp.path(), engine);

    let outcome = pipeline
        .run(&settings(), &BuildOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.zip_size_mb, 0.0);
    assert!(!outcome
        .build_root
        .join(format!("{}.zip", outcome.build_name))
        .exists());
}

#[tokio::test]
async fn no_enabled_scenes_aborts_before_the_engine() {
    let tmp = TempDir::new().unwrap();
    let mut config = common::test_config(tmp.path());
    config.scenes.clear();
    fs::create_dir_all(&config.output.state_dir).unwrap();

    let history = Arc::new(HistoryStore::open(config.history_path()));
    let engine = Arc::new(MockEngine::new(success_report(MB)));
    let pipeline = BuildPipeline::new(config, engine.clone(), history.clone());

    let err = pipeline
        .run(&settings(), &BuildOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::NoScenes));
    assert_eq!(engine.call_count(), 0);
    assert!(history.is_empty());
}

#[tokio::test]
async fn engine_invocation_failure_leaves_no_record() {
    let tmp = TempDir::new().unwrap();
    let (pipeline, history) = make_pipeline(tmp.path(), Arc::new(BrokenEngine));

    let err = pipeline
        .run(&settings(), &BuildOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Engine(_)));
    assert!(history.is_empty());
}

#[tokio::test]
async fn build_log_flag_writes_the_summary() {
    let tmp = TempDir::new().unwrap();
    let engine = Arc::new(MockEngine::new(success_report(MB)).with_artifact(512));
    let (pipeline, history) = make_pipeline(tmp.path(), engine);

    let mut settings = settings();
    settings.generate_build_log = true;
    let outcome = pipeline
        .run(&settings, &BuildOptions::default())
        .await
        .unwrap();

    let summary = outcome
        .build_root
        .join(format!("{}.txt", outcome.build_name));
    assert!(summary.is_file());
    let text = fs::read_to_string(summary).unwrap();
    assert!(text.contains("Product:    MyGame"));

    assert!(outcome.logs_generated);
    assert!(history.snapshot().records[0].logs_generated);
}

#[tokio::test]
async fn unity_log_flag_copies_the_engine_log() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Editor.log"), "engine says hi\n").unwrap();

    let engine = Arc::new(MockEngine::new(success_report(MB)).with_artifact(512));
    let (pipeline, _history) = make_pipeline(tmp.path(), engine);

    let mut settings = settings();
    settings.generate_unity_log = true;
    let outcome = pipeline
        .run(&settings, &BuildOptions::default())
        .await
        .unwrap();

    let copied = outcome
        .build_root
        .join(format!("{}_UnityLog.txt", outcome.build_name));
    assert!(copied.is_file());
    assert!(outcome.logs_generated);
}

#[tokio::test]
async fn heavy_files_flag_writes_the_ranking() {
    let tmp = TempDir::new().unwrap();
    let project_root = tmp.path().join("project");

    let mut report = success_report(2 * MB);
    report.files = vec![
        OutputFile {
            path: project_root.join("Assets/big.png"),
            size: 2 * MB,
        },
        OutputFile {
            path: project_root.join("Assets/small.ogg"),
            size: MB / 2,
        },
    ];
    let engine = Arc::new(MockEngine::new(report).with_artifact(512));
    let (pipeline, _history) = make_pipeline(tmp.path(), engine);

    let mut settings = settings();
    settings.generate_heavy_files_log = true;
    let outcome = pipeline
        .run(&settings, &BuildOptions::default())
        .await
        .unwrap();

    let heavy = outcome
        .build_root
        .join(format!("{}_HeavyFiles.txt", outcome.build_name));
    let text = fs::read_to_string(heavy).unwrap();
    assert!(text.contains("Assets/big.png"));
}

#[tokio::test]
async fn manual_name_and_platform_overrides_apply() {
    let tmp = TempDir::new().unwrap();
    let engine = Arc::new(MockEngine::new(success_report(MB)).with_artifact(512));
    let (pipeline, _history) = make_pipeline(tmp.path(), engine);

    let opts = BuildOptions {
        manual_name: Some("QA_Candidate".to_string()),
        platform: Some(TargetPlatform::Android),
    };
    let outcome = pipeline.run(&settings(), &opts).await.unwrap();

    assert_eq!(outcome.build_name, "QA_Candidate");
    assert_eq!(outcome.platform, TargetPlatform::Android);
    assert!(outcome.build_root.ends_with("Android/QA_Candidate"));
    assert_eq!(
        outcome.build_path.file_name().unwrap().to_str().unwrap(),
        "QA_Candidate.apk"
    );
}

#[tokio::test]
async fn custom_output_path_overrides_the_base_folder() {
    let tmp = TempDir::new().unwrap();
    let engine = Arc::new(MockEngine::new(success_report(MB)).with_artifact(512));
    let (pipeline, _history) = make_pipeline(tmp.path(), engine);

    let custom = tmp.path().join("Delivery");
    let mut settings = settings();
    settings.custom_output_path = Some(custom.clone());
    let outcome = pipeline
        .run(&settings, &BuildOptions::default())
        .await
        .unwrap();

    assert!(outcome.build_root.starts_with(&custom));
}
