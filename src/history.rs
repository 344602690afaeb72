use anyhow::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

/// One row of persisted history. Immutable once appended; history rows are
/// only ever removed by a wholesale clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRecord {
    pub id: Uuid,
    pub timestamp: String,
    pub build_name: String,
    pub build_size_mb: f64,
    pub zip_size_mb: f64,
    pub build_time_sec: f64,
    pub logs_generated: bool,
    pub success: bool,
}

impl BuildRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        timestamp: String,
        build_name: String,
        build_size_mb: f64,
        zip_size_mb: f64,
        build_time_sec: f64,
        logs_generated: bool,
        success: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            build_name,
            build_size_mb,
            zip_size_mb,
            build_time_sec,
            logs_generated,
            success,
        }
    }
}

/// Append-only sequence of build records, insertion order = chronological.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildHistory {
    pub records: Vec<BuildRecord>,
}

/// Owns the persisted history blob. The whole history is serialized on
/// every save; readers only ever observe a complete blob because the save
/// goes through a temp file and a rename.
pub struct HistoryStore {
    path: PathBuf,
    inner: RwLock<BuildHistory>,
}

impl HistoryStore {
    /// Opens the store at `path`. A missing, empty or unreadable blob
    /// yields an empty history, never an error.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let inner = RwLock::new(load_blob(&path));
        Self { path, inner }
    }

    pub fn append(&self, record: BuildRecord) {
        self.inner.write().records.push(record);
    }

    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_vec_pretty(&*self.inner.read())?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn snapshot(&self) -> BuildHistory {
        self.inner.read().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes a column-aligned plain-text table. Presentational only, not
    /// a re-import format.
    pub fn export(&self, dest: &Path) -> io::Result<()> {
        let history = self.snapshot();
        let width = history
            .records
            .iter()
            .map(|r| r.build_name.len())
            .max()
            .unwrap_or("BuildName".len());

        let mut out = String::new();
        out.push_str(&format!(
            "S Timestamp           {:<width$} Size   ZIP    Time  Logs\n",
            "BuildName",
            width = width
        ));
        for r in &history.records {
            let status = if r.success { "\u{2714}" } else { "\u{2716}" };
            out.push_str(&format!(
                "{} {} {:<width$} {:6.2} {:6.2} {:5.1} {}\n",
                status,
                r.timestamp,
                r.build_name,
                r.build_size_mb,
                r.zip_size_mb,
                r.build_time_sec,
                if r.logs_generated { "Yes" } else { "No" },
                width = width
            ));
        }

        fs::write(dest, out)
    }

    /// Drops every record and deletes the blob. Asking the user first is
    /// the caller's responsibility.
    pub fn clear(&self) -> io::Result<()> {
        self.inner.write().records.clear();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

fn load_blob(path: &Path) -> BuildHistory {
    match fs::read(path) {
        Ok(raw) if !raw.is_empty() => match serde_json::from_slice(&raw) {
            Ok(history) => history,
            Err(err) => {
                warn!("unreadable history blob {}: {}", path.display(), err);
                BuildHistory::default()
            }
        },
        _ => BuildHistory::default(),
    }
}
