use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const BYTES_PER_MB: f64 = 1_048_576.0;

pub const DATE_FORMAT: &str = "%d.%m.%Y";
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetPlatform {
    StandaloneWindows,
    StandaloneWindows64,
    StandaloneLinux64,
    #[serde(rename = "StandaloneOSX")]
    StandaloneOsx,
    Android,
    #[serde(rename = "iOS")]
    Ios,
    #[serde(rename = "WebGL")]
    WebGl,
}

struct PlatformSpec {
    platform: TargetPlatform,
    tag: &'static str,
    artifact_ext: &'static str,
}

/// One row per supported target. Adding a platform is a new row here,
/// nothing else branches on the variant.
const PLATFORMS: &[PlatformSpec] = &[
    PlatformSpec {
        platform: TargetPlatform::StandaloneWindows,
        tag: "StandaloneWindows",
        artifact_ext: ".exe",
    },
    PlatformSpec {
        platform: TargetPlatform::StandaloneWindows64,
        tag: "StandaloneWindows64",
        artifact_ext: ".exe",
    },
    PlatformSpec {
        platform: TargetPlatform::StandaloneLinux64,
        tag: "StandaloneLinux64",
        artifact_ext: "",
    },
    PlatformSpec {
        platform: TargetPlatform::StandaloneOsx,
        tag: "StandaloneOSX",
        artifact_ext: "",
    },
    PlatformSpec {
        platform: TargetPlatform::Android,
        tag: "Android",
        artifact_ext: ".apk",
    },
    PlatformSpec {
        platform: TargetPlatform::Ios,
        tag: "iOS",
        artifact_ext: "",
    },
    PlatformSpec {
        platform: TargetPlatform::WebGl,
        tag: "WebGL",
        artifact_ext: "",
    },
];

impl TargetPlatform {
    fn spec(&self) -> &'static PlatformSpec {
        PLATFORMS
            .iter()
            .find(|s| s.platform == *self)
            .expect("every variant has a table row")
    }

    pub fn tag(&self) -> &'static str {
        self.spec().tag
    }

    /// Extension of the final player artifact, empty for targets that
    /// produce a directory or an extensionless binary.
    pub fn artifact_extension(&self) -> &'static str {
        self.spec().artifact_ext
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for TargetPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PLATFORMS
            .iter()
            .find(|spec| spec.tag.eq_ignore_ascii_case(s))
            .map(|spec| spec.platform)
            .ok_or_else(|| format!("unknown target platform: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildStatus {
    Succeeded,
    Failed,
    Cancelled,
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildStatus::Succeeded => "Succeeded",
            BuildStatus::Failed => "Failed",
            BuildStatus::Cancelled => "Cancelled",
        };
        f.write_str(s)
    }
}

/// One produced file as reported by the engine (or reconstructed from the
/// output tree when the engine does not report it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputFile {
    pub path: PathBuf,
    pub size: u64,
}

/// Outcome of one engine invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineReport {
    pub status: BuildStatus,
    /// Duration as measured by the engine itself.
    pub total_seconds: f64,
    pub total_size: u64,
    pub total_errors: u32,
    pub total_warnings: u32,
    /// Per-file size list; empty when the build configuration does not
    /// populate it, in which case heavy-asset reporting falls back to
    /// scraping the engine log.
    pub files: Vec<OutputFile>,
}

impl EngineReport {
    pub fn succeeded(&self) -> bool {
        self.status == BuildStatus::Succeeded
    }
}
