use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::shared::constants::{ALLOWED_IMAGE_TYPES, FALLBACK_EXTENSION, REPORTS_MEDIA_DIR};

/// A fully written temporary upload, ready for relocation.
#[derive(Debug)]
pub struct StagedUpload {
    pub path: PathBuf,
    pub filename: String,
}

/// Writes incoming upload streams to a staging directory on durable
/// storage. No database involvement; a staged file is only addressable
/// through the returned handle until it is promoted.
pub struct UploadStager {
    staging_dir: PathBuf,
}

impl UploadStager {
    pub fn new(uploads_root: &Path) -> Self {
        Self {
            staging_dir: uploads_root.join(REPORTS_MEDIA_DIR),
        }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Create the staging directory if absent. Called at startup and again
    /// before each write, both idempotent.
    pub async fn ensure_layout(&self) -> Result<()> {
        fs::create_dir_all(&self.staging_dir).await?;
        Ok(())
    }

    /// Open a staged write for one upload. Rejects disallowed content types
    /// before any file exists; the caller still drains the stream to keep
    /// the multipart framing intact.
    pub async fn begin(
        &self,
        declared_filename: Option<&str>,
        content_type: &str,
    ) -> Result<StagedWrite> {
        if !is_allowed_content_type(content_type) {
            return Err(AppError::Validation(format!(
                "Unsupported media type: {}",
                content_type
            )));
        }

        self.ensure_layout().await?;

        let ext = infer_extension(declared_filename, content_type);
        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let path = self.staging_dir.join(&filename);
        let file = File::create(&path).await?;

        tracing::debug!(staged = %path.display(), "upload staged write opened");

        Ok(StagedWrite {
            file,
            path,
            filename,
        })
    }

    /// Remove a staged file that will not be promoted. Best effort; a
    /// leftover staged file is unreachable from any record.
    pub async fn discard(&self, staged: &StagedUpload) {
        if let Err(e) = fs::remove_file(&staged.path).await {
            tracing::warn!(
                path = %staged.path.display(),
                error = %e,
                "failed to remove staged upload"
            );
        }
    }
}

/// In-progress staged write. Consume with `finish` or `abort`.
#[derive(Debug)]
pub struct StagedWrite {
    file: File,
    path: PathBuf,
    filename: String,
}

impl StagedWrite {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.file.write_all(chunk).await?;
        Ok(())
    }

    /// A file that fails to sync is removed rather than left behind; the
    /// caller only ever holds a `StagedUpload` for a fully durable file.
    pub async fn finish(self) -> Result<StagedUpload> {
        if let Err(e) = self.file.sync_all().await {
            drop(self.file);
            let _ = fs::remove_file(&self.path).await;
            return Err(e.into());
        }
        Ok(StagedUpload {
            path: self.path,
            filename: self.filename,
        })
    }

    /// Drop the partial file after a mid-stream failure.
    pub async fn abort(self) {
        drop(self.file);
        if let Err(e) = fs::remove_file(&self.path).await {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove aborted upload");
        }
    }
}

pub fn is_allowed_content_type(content_type: &str) -> bool {
    ALLOWED_IMAGE_TYPES.iter().any(|(ct, _)| *ct == content_type)
}

/// Extension selection: declared filename first, then the content-type
/// mapping, then the generic fallback. Declared extensions are normalized
/// to short lowercase alphanumerics so they are safe in a path.
pub fn infer_extension(declared_filename: Option<&str>, content_type: &str) -> String {
    declared_filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .or_else(|| {
            ALLOWED_IMAGE_TYPES
                .iter()
                .find(|(ct, _)| *ct == content_type)
                .map(|(_, ext)| ext.to_string())
        })
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::validation::MEDIA_FILENAME_REGEX;

    #[test]
    fn test_infer_extension_prefers_declared_filename() {
        assert_eq!(infer_extension(Some("photo.JPEG"), "image/png"), "jpeg");
        assert_eq!(infer_extension(Some("a.b.webp"), "image/jpeg"), "webp");
    }

    #[test]
    fn test_infer_extension_falls_back_to_content_type() {
        assert_eq!(infer_extension(Some("photo"), "image/jpeg"), "jpg");
        assert_eq!(infer_extension(None, "image/webp"), "webp");
    }

    #[test]
    fn test_infer_extension_generic_fallback() {
        assert_eq!(infer_extension(None, "application/octet-stream"), "bin");
        // Hostile declared extensions are discarded, not sanitized in place.
        assert_eq!(infer_extension(Some("x.j/p../g"), "text/plain"), "bin");
    }

    #[test]
    fn test_allow_list() {
        assert!(is_allowed_content_type("image/jpeg"));
        assert!(is_allowed_content_type("image/png"));
        assert!(is_allowed_content_type("image/webp"));
        assert!(!is_allowed_content_type("image/gif"));
        assert!(!is_allowed_content_type("application/pdf"));
    }

    #[tokio::test]
    async fn test_stage_writes_file_with_collision_resistant_name() {
        let dir = tempfile::tempdir().unwrap();
        let stager = UploadStager::new(dir.path());

        let mut write = stager.begin(Some("pothole.png"), "image/png").await.unwrap();
        write.write_chunk(b"abc").await.unwrap();
        write.write_chunk(b"def").await.unwrap();
        let staged = write.finish().await.unwrap();

        assert!(MEDIA_FILENAME_REGEX.is_match(&staged.filename));
        assert!(staged.filename.ends_with(".png"));
        let data = tokio::fs::read(&staged.path).await.unwrap();
        assert_eq!(data, b"abcdef");
    }

    #[tokio::test]
    async fn test_disallowed_type_rejected_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let stager = UploadStager::new(dir.path());

        let err = stager.begin(Some("x.gif"), "image/gif").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // Nothing persisted, not even the staging directory contents.
        let staging = stager.staging_dir();
        if staging.exists() {
            assert_eq!(std::fs::read_dir(staging).unwrap().count(), 0);
        }
    }

    #[tokio::test]
    async fn test_discard_removes_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let stager = UploadStager::new(dir.path());

        let mut write = stager.begin(None, "image/jpeg").await.unwrap();
        write.write_chunk(b"payload").await.unwrap();
        let staged = write.finish().await.unwrap();
        assert!(staged.path.exists());

        stager.discard(&staged).await;
        assert!(!staged.path.exists());
    }

    #[tokio::test]
    async fn test_abort_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let stager = UploadStager::new(dir.path());

        let mut write = stager.begin(None, "image/jpeg").await.unwrap();
        write.write_chunk(b"partial").await.unwrap();
        let path = write.path.clone();
        write.abort().await;
        assert!(!path.exists());
    }
}
