use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::{NewReport, Report};
use crate::shared::validation::MEDIA_FILENAME_REGEX;

const REPORT_COLUMNS: &str =
    "id, lat, lng, detail, img, device_id, user_agent, category_id, responsible, created_at";

/// Record store for report rows. Creation and media attachment are
/// deliberately separate writes: the media path is derived from the report
/// id, so the id must exist before the file's final location is known.
pub struct ReportService {
    pool: PgPool,
}

impl ReportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a report row with an empty media field, under a
    /// caller-supplied (pre-generated) identifier.
    pub async fn create_without_media(&self, id: Uuid, data: &NewReport) -> Result<Report> {
        let report = sqlx::query_as::<_, Report>(&format!(
            "INSERT INTO reports (id, lat, lng, detail, img, device_id, user_agent, category_id) \
             VALUES ($1, $2, $3, $4, '', $5, $6, $7) \
             RETURNING {}",
            REPORT_COLUMNS
        ))
        .bind(id)
        .bind(data.lat)
        .bind(data.lng)
        .bind(&data.detail)
        .bind(&data.device_id)
        .bind(&data.user_agent)
        .bind(data.category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create report: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(report_id = %report.id, "created report row (media pending)");
        Ok(report)
    }

    /// Point the row at its relocated media file, inside the caller's
    /// transaction. The filename must be one the stager produced; anything
    /// else never reaches the column.
    pub async fn attach_media(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        report_id: Uuid,
        filename: &str,
    ) -> Result<()> {
        if !MEDIA_FILENAME_REGEX.is_match(filename) {
            return Err(AppError::Internal(format!(
                "Refusing to attach non-staged media filename: {}",
                filename
            )));
        }

        let result = sqlx::query("UPDATE reports SET img = $2 WHERE id = $1")
            .bind(report_id)
            .bind(filename)
            .execute(&mut **tx)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Report {} not found", report_id)));
        }

        tracing::info!(report_id = %report_id, img = %filename, "media attached");
        Ok(())
    }

    /// Set the responsible institution. The caller has already confirmed the
    /// institution exists; an unknown report leaves `responsible` untouched.
    pub async fn assign_responsible(&self, report_id: Uuid, institution_id: Uuid) -> Result<()> {
        let result = sqlx::query("UPDATE reports SET responsible = $2 WHERE id = $1")
            .bind(report_id)
            .bind(institution_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Report {} not found", report_id)));
        }

        tracing::info!(report_id = %report_id, institution_id = %institution_id, "report assigned");
        Ok(())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Report> {
        sqlx::query_as::<_, Report>(&format!(
            "SELECT {} FROM reports WHERE id = $1",
            REPORT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))
    }

    /// Rows with attached media only. A row whose `img` is still empty is an
    /// upload in progress (or a failed one awaiting reconciliation) and must
    /// not be listed.
    pub async fn list_visible(&self) -> Result<Vec<Report>> {
        sqlx::query_as::<_, Report>(&format!(
            "SELECT {} FROM reports WHERE img <> '' ORDER BY created_at DESC",
            REPORT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }
}
