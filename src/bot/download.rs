//! Transient attachment downloads.
//!
//! Files are fetched into the configured download directory and removed
//! again when the guard goes out of scope, on every exit path.

use std::fmt;
use std::path::{Path, PathBuf};
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::FileId;
use tracing::debug;

#[derive(Debug)]
pub enum DownloadError {
    /// Telegram refused the file-info or download request.
    Telegram(String),
    /// Local filesystem failure.
    Io(std::io::Error),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadError::Telegram(e) => write!(f, "{e}"),
            DownloadError::Io(e) => write!(f, "filesystem error: {e}"),
        }
    }
}

impl std::error::Error for DownloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DownloadError::Telegram(_) => None,
            DownloadError::Io(e) => Some(e),
        }
    }
}

/// A downloaded file that is deleted when dropped.
pub struct DownloadedFile {
    path: PathBuf,
}

impl DownloadedFile {
    /// Take ownership of an already-written file; it is removed on drop.
    pub fn claim(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DownloadedFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Strip any directory components from a client-supplied file name.
fn sanitize_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string())
}

/// Fetch a Telegram file into `dir` and return the deletion guard.
pub async fn fetch_to_dir(
    bot: &Bot,
    file_id: FileId,
    dir: &Path,
    file_name: &str,
) -> Result<DownloadedFile, DownloadError> {
    std::fs::create_dir_all(dir).map_err(DownloadError::Io)?;

    let file = bot
        .get_file(file_id)
        .await
        .map_err(|e| DownloadError::Telegram(format!("failed to get file info: {e}")))?;

    let mut data = Vec::new();
    bot.download_file(&file.path, &mut data)
        .await
        .map_err(|e| DownloadError::Telegram(format!("failed to download file: {e}")))?;

    let path = dir.join(sanitize_name(file_name));
    std::fs::write(&path, &data).map_err(DownloadError::Io)?;
    debug!("📥 Downloaded {} bytes to {:?}", data.len(), path);

    Ok(DownloadedFile::claim(path))
}
