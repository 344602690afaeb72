use crate::core::{EngineReport, OutputFile, TargetPlatform, BYTES_PER_MB};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_TOP_N: usize = 20;
pub const LOG_TAIL_LINES: usize = 800;

const RULE: &str = "---------------------------------------------";

/// Writes `<build_name>.txt` next to the build output, overwriting any
/// prior summary. Size and duration only appear for successful builds.
pub fn write_summary(
    folder: &Path,
    report: &EngineReport,
    build_name: &str,
    project_name: &str,
    platform: TargetPlatform,
    timestamp: &str,
) -> io::Result<()> {
    let mut out = String::new();
    out.push_str(&format!("Build Name: {}\n", build_name));
    out.push_str(&format!("Product:    {}\n", project_name));
    out.push_str(&format!("Target:     {}\n", platform));
    out.push_str(&format!("Date: {}\n", timestamp));
    out.push_str(&format!("Result:     {}\n", report.status));
    out.push_str(&format!("Errors:     {}\n", report.total_errors));
    out.push_str(&format!("Warnings:   {}\n", report.total_warnings));

    if report.succeeded() {
        let size_mb = report.total_size as f64 / BYTES_PER_MB;
        out.push_str(&format!("Size:       {:.2} MB\n", size_mb));
        out.push_str(&format!("Time:       {:.1} s\n", report.total_seconds));
    }

    fs::write(folder.join(format!("{}.txt", build_name)), out)
}

/// Locates the engine's own run log. Search order: the primary known
/// location under the local data dir, then sibling `Editor*` directories,
/// then the macOS library path.
pub fn find_engine_log() -> Option<PathBuf> {
    if let Some(local) = dirs::data_local_dir() {
        let primary = local.join("Unity").join("Editor").join("Editor.log");
        if primary.is_file() {
            return Some(primary);
        }

        let root = local.join("Unity");
        if let Ok(entries) = fs::read_dir(&root) {
            for entry in entries.flatten() {
                let name = entry.file_name();
                let Some(name) = name.to_str() else { continue };
                if name.starts_with("Editor") && entry.path().is_dir() {
                    let candidate = entry.path().join("Editor.log");
                    if candidate.is_file() {
                        return Some(candidate);
                    }
                }
            }
        }
    }

    let mac = dirs::home_dir()?
        .join("Library")
        .join("Logs")
        .join("Unity")
        .join("Editor.log");
    mac.is_file().then_some(mac)
}

/// Copies the tail of the engine log to `<build_name>_UnityLog.txt`.
///
/// The log may still be appended to by a running engine process, and may
/// simply not exist on a given machine, so every failure here collapses
/// to `false` instead of an error.
pub fn copy_engine_log(folder: &Path, build_name: &str, log_override: Option<&Path>) -> bool {
    let src = log_override
        .filter(|p| p.is_file())
        .map(Path::to_path_buf)
        .or_else(find_engine_log);
    let Some(src) = src else {
        return false;
    };

    let dst = folder.join(format!("{}_UnityLog.txt", build_name));
    match copy_tail(&src, &dst, LOG_TAIL_LINES) {
        Ok(()) => true,
        Err(err) => {
            warn!("failed to copy engine log from {}: {}", src.display(), err);
            false
        }
    }
}

fn copy_tail(src: &Path, dst: &Path, keep: usize) -> io::Result<()> {
    let raw = fs::read(src)?;
    let content = String::from_utf8_lossy(&raw);
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(keep);
    let mut out = lines[start..].join("\n");
    out.push('\n');
    fs::write(dst, out)
}

/// A single ranked entry: megabytes plus a project-relative (or absolute)
/// asset path.
#[derive(Debug, Clone, PartialEq)]
pub struct HeavyAsset {
    pub size_mb: f64,
    pub path: String,
}

/// Ranks the assets that dominate build size. Two implementations exist:
/// the structured per-file list the engine sometimes returns, and a
/// scrape of the engine log's `Used Assets` section when it does not.
pub trait HeavyAssetSource {
    fn rank(&self, top_n: usize) -> Vec<HeavyAsset>;
}

/// Primary source: the engine's structured per-file size list.
pub struct ReportedSizes<'a> {
    files: &'a [OutputFile],
    project_root: &'a Path,
}

impl<'a> ReportedSizes<'a> {
    pub fn new(files: &'a [OutputFile], project_root: &'a Path) -> Self {
        Self {
            files,
            project_root,
        }
    }
}

impl HeavyAssetSource for ReportedSizes<'_> {
    fn rank(&self, top_n: usize) -> Vec<HeavyAsset> {
        let mut files: Vec<&OutputFile> = self.files.iter().collect();
        files.sort_by(|a, b| b.size.cmp(&a.size));
        files
            .into_iter()
            .take(top_n)
            .map(|f| HeavyAsset {
                size_mb: f.size as f64 / BYTES_PER_MB,
                path: project_relative(&f.path, self.project_root),
            })
            .collect()
    }
}

/// Fallback source: the `Used Assets` section of the engine's free-text
/// log. The per-run section format is assumed stable but not guaranteed,
/// so unparseable lines are skipped rather than fatal.
pub struct LogSection {
    entries: Vec<HeavyAsset>,
}

impl LogSection {
    /// Finds the last `Used Assets` heading and collects entries up to the
    /// first blank line. Returns `None` when no heading exists.
    ///
    /// Expected line shape: `7.3 mb  12.8% Assets/...` - a leading
    /// megabyte size, then noise, then the asset path as the final token.
    pub fn parse(content: &str) -> Option<Self> {
        let lines: Vec<&str> = content.lines().collect();
        let start = lines.iter().rposition(|l| {
            let t = l.trim_start();
            t.starts_with("Used Assets") || t.starts_with("Used assets")
        })?;

        let mut entries = Vec::new();
        for line in &lines[start + 1..] {
            let line = line.trim();
            if line.is_empty() {
                break;
            }
            let Some(first) = line.split(['\t', ' ']).next() else {
                continue;
            };
            let Ok(size_mb) = first.parse::<f64>() else {
                continue;
            };
            let path = line.rsplit(' ').next().unwrap_or(line).to_string();
            entries.push(HeavyAsset { size_mb, path });
        }

        Some(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl HeavyAssetSource for LogSection {
    fn rank(&self, top_n: usize) -> Vec<HeavyAsset> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.size_mb.total_cmp(&a.size_mb));
        ranked.truncate(top_n);
        ranked
    }
}

/// Writes `<build_name>_HeavyFiles.txt` from the structured size list when
/// the report carries one, otherwise from the engine log. Returns whether
/// a file was written; absent or unparseable fallback data is "no data",
/// not an error.
pub fn write_heavy_files_log(
    report: &EngineReport,
    project_root: &Path,
    output_root: &Path,
    build_name: &str,
    top_n: usize,
    log_override: Option<&Path>,
) -> io::Result<bool> {
    let dst = output_root.join(format!("{}_HeavyFiles.txt", build_name));

    if !report.files.is_empty() {
        let source = ReportedSizes::new(&report.files, project_root);
        let header = format!("Top {} assets in build (uncompressed size):", top_n);
        write_ranked(&dst, &header, &source.rank(top_n))?;
        return Ok(true);
    }

    let src = log_override
        .filter(|p| p.is_file())
        .map(Path::to_path_buf)
        .or_else(find_engine_log);
    let Some(src) = src else {
        return Ok(false);
    };

    let raw = match fs::read(&src) {
        Ok(raw) => raw,
        Err(err) => {
            warn!("failed to read engine log {}: {}", src.display(), err);
            return Ok(false);
        }
    };
    let content = String::from_utf8_lossy(&raw);
    let Some(section) = LogSection::parse(&content) else {
        return Ok(false);
    };
    if section.is_empty() {
        return Ok(false);
    }

    let header = format!(
        "Top {} assets in build (uncompressed size, parsed from Editor.log):",
        top_n
    );
    write_ranked(&dst, &header, &section.rank(top_n))?;
    Ok(true)
}

fn write_ranked(dst: &Path, header: &str, assets: &[HeavyAsset]) -> io::Result<()> {
    let mut out = String::new();
    out.push_str(header);
    out.push('\n');
    out.push_str(RULE);
    out.push('\n');
    for asset in assets {
        out.push_str(&format!("{:6.2} MB  {}\n", asset.size_mb, asset.path));
    }
    fs::write(dst, out)
}

fn project_relative(path: &Path, project_root: &Path) -> String {
    match path.strip_prefix(project_root) {
        Ok(rel) => rel.display().to_string(),
        Err(_) => path.display().to_string(),
    }
}
