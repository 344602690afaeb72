use anyhow::Result;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Archives `<build_root>/<name>` to `<build_root>/<name>.zip`, replacing
/// any prior archive of the same name. Returns the archive size in bytes.
pub fn zip_build_output(build_root: &Path, name: &str) -> Result<u64> {
    let src = build_root.join(name);
    let dst = build_root.join(format!("{}.zip", name));

    if dst.exists() {
        fs::remove_file(&dst)?;
    }

    let file = File::create(&dst)?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(&src) {
        let entry = entry?;
        let path = entry.path();
        let rel = path.strip_prefix(&src)?;

        if path.is_file() {
            zip.start_file(rel.to_string_lossy(), options)?;
            let mut f = File::open(path)?;
            io::copy(&mut f, &mut zip)?;
        } else if !rel.as_os_str().is_empty() {
            zip.add_directory(rel.to_string_lossy(), options)?;
        }
    }
    zip.finish()?;

    Ok(fs::metadata(&dst)?.len())
}
