//! Upload staging

use std::path::{Path, PathBuf};

use tokio::fs;

/// Reduce a client-supplied file name to its last path component.
///
/// Returns `None` for names with nothing usable left (`""`, `"."`, `"dir/"`).
pub fn sanitize_filename(name: &str) -> Option<&str> {
    let base = name.rsplit(['/', '\\']).next()?.trim();
    match base {
        "" | "." | ".." => None,
        base => Some(base),
    }
}

/// Write an uploaded file into the staging folder, creating it if needed.
pub async fn stage(dir: &Path, filename: &str, data: &[u8]) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir).await?;
    let path = dir.join(filename);
    fs::write(&path, data).await?;
    Ok(path)
}
