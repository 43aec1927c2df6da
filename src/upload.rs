use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tokio::fs;

/// Strips directory components and anything that could escape the upload
/// dir, leaving a flat media filename.
pub fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .trim()
        .trim_matches('.');

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();

    if cleaned.trim_matches(['-', '.']).is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Writes the uploaded bytes under the upload dir and returns the public URL
/// path. Concurrent uploads of the same name race; last write wins.
pub async fn save(upload_dir: &Path, filename: &str, bytes: &[u8]) -> anyhow::Result<String> {
    let filename = sanitize_filename(filename);

    fs::create_dir_all(upload_dir)
        .await
        .with_context(|| format!("create upload dir: {}", upload_dir.display()))?;

    let path: PathBuf = upload_dir.join(&filename);
    fs::write(&path, bytes)
        .await
        .with_context(|| format!("write upload: {}", path.display()))?;

    Ok(format!("/media/{filename}"))
}
