pub mod archive;
pub mod config;
pub mod core;
pub mod engine;
pub mod history;
pub mod naming;
pub mod pipeline;
pub mod reports;
pub mod server;
pub mod settings;

pub use self::config::RunnerConfig;
pub use self::core::{BuildStatus, EngineReport, OutputFile, TargetPlatform};
pub use self::engine::{BuildEngine, BuildSpec, ProcessEngine};
pub use self::history::{BuildHistory, BuildRecord, HistoryStore};
pub use self::naming::BuildIdentity;
pub use self::pipeline::{BuildOptions, BuildPipeline, PipelineError, PipelineOutcome};
pub use self::settings::BuildSettings;
