use crate::core::{TargetPlatform, DATE_FORMAT};
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Resolved name and directory tree for one build attempt.
#[derive(Debug, Clone, Serialize)]
pub struct BuildIdentity {
    pub project_name: String,
    pub platform: TargetPlatform,
    pub date: String,
    pub base_folder: PathBuf,
    pub build_name: String,
    /// `<base>/<name>` - holds the output dir, summary files and the zip.
    pub build_root: PathBuf,
    /// `<base>/<name>/<name>` - what the engine writes into and what gets
    /// zipped.
    pub build_output: PathBuf,
    /// Final player artifact inside the output dir.
    pub build_path: PathBuf,
}

/// Computes a collision-free build identity.
///
/// Automatic naming scans the base folder for `Build_<project>_<date>_N`
/// siblings and picks the next counter, so repeated same-day builds never
/// overwrite each other. A manual name is taken verbatim; uniqueness is
/// then the caller's problem.
pub fn resolve(
    project_name: &str,
    platform: TargetPlatform,
    manual_name: Option<&str>,
    custom_root: Option<&Path>,
    builds_root: &Path,
    date: NaiveDate,
) -> io::Result<BuildIdentity> {
    let date = date.format(DATE_FORMAT).to_string();
    let base_folder = match custom_root {
        Some(root) => root.to_path_buf(),
        None => builds_root.join(platform.tag()),
    };

    let build_name = match manual_name {
        Some(name) => name.to_string(),
        None => {
            if !base_folder.exists() {
                fs::create_dir_all(&base_folder)?;
            }
            next_automatic_name(&base_folder, project_name, &date)?
        }
    };

    let build_root = base_folder.join(&build_name);
    let build_output = build_root.join(&build_name);
    let artifact = format!("{}{}", build_name, platform.artifact_extension());
    let build_path = build_output.join(artifact);

    Ok(BuildIdentity {
        project_name: project_name.to_string(),
        platform,
        date,
        base_folder,
        build_name,
        build_root,
        build_output,
        build_path,
    })
}

fn next_automatic_name(base: &Path, project: &str, date: &str) -> io::Result<String> {
    let prefix = format!("Build_{}_{}_", project, date);

    let mut max_suffix: Option<u32> = None;
    for entry in fs::read_dir(base)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(rest) = name.strip_prefix(&prefix) {
            // A matching folder with a mangled suffix still occupies slot 0.
            let suffix = rest.parse::<u32>().unwrap_or(0);
            max_suffix = Some(max_suffix.map_or(suffix, |m| m.max(suffix)));
        }
    }

    let next = max_suffix.map_or(1, |m| m + 1);
    Ok(format!("{}{}", prefix, next))
}
