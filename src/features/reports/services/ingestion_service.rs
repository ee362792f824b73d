use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::NewReport;
use crate::features::reports::services::{LedgerService, ReportService};
use crate::features::statuses::services::StatusService;
use crate::modules::storage::{MediaRelocator, StagedUpload, UploadStager};

/// Orchestrates the two-resource ingestion flow. The filesystem and the
/// database are never covered by one transaction; consistency comes from
/// ordering. The report id is generated here, before any row exists, so the
/// media file reaches its permanent report-addressed path first and no
/// observable state ever has a row pointing at a missing file.
pub struct IngestionService {
    pool: PgPool,
    stager: Arc<UploadStager>,
    relocator: Arc<MediaRelocator>,
    reports: Arc<ReportService>,
    ledger: Arc<LedgerService>,
    statuses: Arc<StatusService>,
}

impl IngestionService {
    pub fn new(
        pool: PgPool,
        stager: Arc<UploadStager>,
        relocator: Arc<MediaRelocator>,
        reports: Arc<ReportService>,
        ledger: Arc<LedgerService>,
        statuses: Arc<StatusService>,
    ) -> Self {
        Self {
            pool,
            stager,
            relocator,
            reports,
            ledger,
            statuses,
        }
    }

    pub fn stager(&self) -> &UploadStager {
        &self.stager
    }

    /// Persist a validated submission. Takes ownership of the staged file:
    /// on any failure before the row exists, the staged or promoted file is
    /// cleaned up; after the row exists, partial state is kept and logged
    /// for reconciliation by id rather than silently deleted.
    pub async fn ingest(&self, data: NewReport, staged: StagedUpload) -> Result<Uuid> {
        let initial_status = self.statuses.initial_status().await?;

        let report_id = Uuid::new_v4();

        // File first: a crash from here on can orphan a file under the
        // pre-generated id, never a row with a dangling media pointer.
        let filename = match self.relocator.promote(report_id, &staged).await {
            Ok(filename) => filename,
            Err(e) => {
                self.stager.discard(&staged).await;
                return Err(e);
            }
        };

        if let Err(e) = self.reports.create_without_media(report_id, &data).await {
            self.relocator.demote(report_id, &filename).await;
            return Err(e);
        }

        // Media attachment and the opening ledger entry commit together: a
        // report is either invisible (img still empty) or fully formed with
        // a current status, never listed with an empty ledger.
        if let Err(e) = self
            .attach_and_open_ledger(report_id, initial_status.id, &filename)
            .await
        {
            // Row exists with empty img; the promoted file is addressable by
            // the report id. Left for an operational reconciliation sweep.
            tracing::warn!(
                report_id = %report_id,
                file = %filename,
                "media attach failed after relocation; row kept for reconciliation"
            );
            return Err(e);
        }

        tracing::info!(report_id = %report_id, "report ingested");
        Ok(report_id)
    }

    async fn attach_and_open_ledger(
        &self,
        report_id: Uuid,
        initial_status: i32,
        filename: &str,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        self.reports
            .attach_media(&mut tx, report_id, filename)
            .await?;
        self.ledger
            .append_initial(&mut tx, report_id, initial_status, None, Some(filename))
            .await?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }
}
