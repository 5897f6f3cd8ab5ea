/// Local-disk storage for product images under `<public_dir>/uploads`.
use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::models::product::UploadedFile;

pub const UPLOADS_PREFIX: &str = "/uploads/";

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(public_dir: impl AsRef<Path>) -> Self {
        Self { dir: public_dir.as_ref().join("uploads") }
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating {}", self.dir.display()))
    }

    /// Writes `bytes` as `<unix-millis>-<name>` and returns its public url.
    /// An existing file is never overwritten: the timestamp is bumped until
    /// the name is free.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        self.ensure_dir().await?;
        let mut millis = chrono::Utc::now().timestamp_millis();
        loop {
            let file_name = stored_name(millis, original_name);
            let path = self.dir.join(&file_name);
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    millis += 1;
                    continue;
                }
                Err(e) => return Err(e).with_context(|| format!("creating {}", path.display())),
            };
            file.write_all(bytes)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            file.flush().await?;
            tracing::debug!(path = %path.display(), size = bytes.len(), "upload stored");
            return Ok(format!("{UPLOADS_PREFIX}{file_name}"));
        }
    }

    pub async fn save_all(&self, files: &[UploadedFile]) -> Result<Vec<String>> {
        let mut urls = Vec::with_capacity(files.len());
        for file in files {
            urls.push(self.save(&file.file_name, &file.bytes).await?);
        }
        Ok(urls)
    }

    /// Best-effort removal. Missing files and urls outside the uploads
    /// root are logged and skipped.
    pub async fn discard<S: AsRef<str>>(&self, urls: &[S]) {
        for url in urls {
            let url = url.as_ref();
            let Some(path) = self.resolve(url) else {
                tracing::warn!(%url, "refusing to delete path outside uploads root");
                continue;
            };
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::debug!(%url, "upload deleted"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::warn!(%url, "upload already missing")
                }
                Err(e) => tracing::warn!(%url, error = %e, "failed to delete upload"),
            }
        }
    }

    /// Maps a public url to its file, rejecting anything that is not a
    /// single plain file name directly under the uploads directory.
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        let rest = url.strip_prefix(UPLOADS_PREFIX)?;
        let mut components = Path::new(rest).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Some(self.dir.join(name)),
            _ => None,
        }
    }
}

/// Keeps only the final path component of a client supplied file name and
/// replaces anything outside `[A-Za-z0-9._-]` so the url needs no escaping.
fn stored_name(millis: i64, original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or("upload");
    let safe: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    format!("{millis}-{safe}")
}
