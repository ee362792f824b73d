use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::core::error::Result;
use crate::modules::storage::stager::StagedUpload;
use crate::shared::constants::REPORTS_MEDIA_DIR;

/// Moves a staged file to its permanent, report-addressed location.
/// Rename within a volume, copy-then-delete across volumes. Never touches
/// the database.
pub struct MediaRelocator {
    media_root: PathBuf,
}

impl MediaRelocator {
    pub fn new(uploads_root: &Path) -> Self {
        Self {
            media_root: uploads_root.join(REPORTS_MEDIA_DIR),
        }
    }

    pub fn final_path(&self, report_id: Uuid, filename: &str) -> PathBuf {
        self.media_root.join(report_id.to_string()).join(filename)
    }

    /// Move the staged file into `<root>/reports/<report_id>/`, creating the
    /// directory if needed. Returns the filename stored on the report row.
    pub async fn promote(&self, report_id: Uuid, staged: &StagedUpload) -> Result<String> {
        let report_dir = self.media_root.join(report_id.to_string());
        fs::create_dir_all(&report_dir).await?;

        let dest = report_dir.join(&staged.filename);
        match fs::rename(&staged.path, &dest).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::CrossesDevices => {
                // Staging and final directories sit on different volumes.
                // The copy completes in full before the source is removed.
                fs::copy(&staged.path, &dest).await?;
                fs::remove_file(&staged.path).await?;
            }
            Err(e) => return Err(e.into()),
        }

        tracing::debug!(report_id = %report_id, file = %dest.display(), "media promoted");
        Ok(staged.filename.clone())
    }

    /// Compensating cleanup: remove a promoted file and its per-report
    /// directory. Best effort, used when the record insert fails after the
    /// file has already been moved.
    pub async fn demote(&self, report_id: Uuid, filename: &str) {
        let report_dir = self.media_root.join(report_id.to_string());
        let file = report_dir.join(filename);
        if let Err(e) = fs::remove_file(&file).await {
            tracing::warn!(path = %file.display(), error = %e, "failed to remove promoted media");
        }
        // Only succeeds when empty, which is the expected state here.
        let _ = fs::remove_dir(&report_dir).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::stager::UploadStager;

    async fn stage_fixture(root: &Path, payload: &[u8]) -> StagedUpload {
        let stager = UploadStager::new(root);
        let mut write = stager.begin(None, "image/jpeg").await.unwrap();
        write.write_chunk(payload).await.unwrap();
        write.finish().await.unwrap()
    }

    #[tokio::test]
    async fn test_promote_moves_file_into_report_directory() {
        let dir = tempfile::tempdir().unwrap();
        let relocator = MediaRelocator::new(dir.path());
        let staged = stage_fixture(dir.path(), b"image-bytes").await;
        let report_id = Uuid::new_v4();

        let filename = relocator.promote(report_id, &staged).await.unwrap();

        assert_eq!(filename, staged.filename);
        assert!(!staged.path.exists());
        let final_path = relocator.final_path(report_id, &filename);
        assert_eq!(
            tokio::fs::read(&final_path).await.unwrap(),
            b"image-bytes"
        );
    }

    #[tokio::test]
    async fn test_promote_creates_missing_report_directory() {
        let dir = tempfile::tempdir().unwrap();
        let relocator = MediaRelocator::new(dir.path());
        let staged = stage_fixture(dir.path(), b"x").await;
        let report_id = Uuid::new_v4();

        assert!(!dir.path().join("reports").join(report_id.to_string()).exists());
        relocator.promote(report_id, &staged).await.unwrap();
        assert!(dir.path().join("reports").join(report_id.to_string()).is_dir());
    }

    #[tokio::test]
    async fn test_demote_removes_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let relocator = MediaRelocator::new(dir.path());
        let staged = stage_fixture(dir.path(), b"x").await;
        let report_id = Uuid::new_v4();
        let filename = relocator.promote(report_id, &staged).await.unwrap();

        relocator.demote(report_id, &filename).await;

        assert!(!relocator.final_path(report_id, &filename).exists());
        assert!(!dir.path().join("reports").join(report_id.to_string()).exists());
    }
}
