use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::StatusHistoryEntry;
use crate::features::statuses::models::Status;

const ENTRY_COLUMNS: &str = "id, report_id, from_status, to_status, changed_at, changed_by, \
                             media_before, media_after, finished, finished_at, note";

/// Append-only status ledger. The current status of a report is the
/// `to_status` of its most recent entry; nothing here ever updates or
/// deletes an existing entry.
pub struct LedgerService {
    pool: PgPool,
}

impl LedgerService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// First entry for a freshly created report, inside the caller's
    /// transaction so the media attachment and the opening ledger entry
    /// land together. `from_status` is NULL by definition; no lock is
    /// needed because the report id is not yet visible to any other writer.
    pub async fn append_initial(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        report_id: Uuid,
        to_status: i32,
        note: Option<&str>,
        media_after: Option<&str>,
    ) -> Result<StatusHistoryEntry> {
        let entry = sqlx::query_as::<_, StatusHistoryEntry>(&format!(
            "INSERT INTO status_history (report_id, from_status, to_status, media_after, note) \
             VALUES ($1, NULL, $2, $3, $4) \
             RETURNING {}",
            ENTRY_COLUMNS
        ))
        .bind(report_id)
        .bind(to_status)
        .bind(media_after)
        .bind(note)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to append initial ledger entry: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(report_id = %report_id, to_status, "initial status recorded");
        Ok(entry)
    }

    /// Explicit status change. Runs in one transaction holding a row lock on
    /// the report, so concurrent transitions on the same report serialize
    /// and the ledger stays a linear path: each new entry's `from_status`
    /// is exactly the previous entry's `to_status`.
    ///
    /// The caller has already validated `target` as a reachable status.
    pub async fn append_transition(
        &self,
        report_id: Uuid,
        target: &Status,
        note: Option<&str>,
        changed_by: Option<&str>,
    ) -> Result<StatusHistoryEntry> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let locked: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM reports WHERE id = $1 FOR UPDATE")
                .bind(report_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(AppError::Database)?;
        if locked.is_none() {
            return Err(AppError::NotFound(format!("Report {} not found", report_id)));
        }

        let latest = self.latest_in_tx(&mut tx, report_id).await?;
        let from_status = latest.as_ref().map(|e| e.to_status);

        let finished = target.is_terminal();
        if finished {
            let already: Option<(i64,)> = sqlx::query_as(
                "SELECT id FROM status_history WHERE report_id = $1 AND finished LIMIT 1",
            )
            .bind(report_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;
            if already.is_some() {
                return Err(AppError::Conflict(format!(
                    "Report {} is already resolved",
                    report_id
                )));
            }
        }

        let changed_at = Utc::now();
        let entry = sqlx::query_as::<_, StatusHistoryEntry>(&format!(
            "INSERT INTO status_history \
             (report_id, from_status, to_status, changed_at, changed_by, finished, finished_at, note) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {}",
            ENTRY_COLUMNS
        ))
        .bind(report_id)
        .bind(from_status)
        .bind(target.id)
        .bind(changed_at)
        .bind(changed_by)
        .bind(finished)
        .bind(finished.then_some(changed_at))
        .bind(note)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to append status transition: {:?}", e);
            AppError::Database(e)
        })?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            report_id = %report_id,
            from_status = ?from_status,
            to_status = target.id,
            finished,
            "status transition recorded"
        );
        Ok(entry)
    }

    async fn latest_in_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        report_id: Uuid,
    ) -> Result<Option<StatusHistoryEntry>> {
        sqlx::query_as::<_, StatusHistoryEntry>(&format!(
            "SELECT {} FROM status_history WHERE report_id = $1 \
             ORDER BY changed_at DESC, id DESC LIMIT 1",
            ENTRY_COLUMNS
        ))
        .bind(report_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::Database)
    }

    /// The `to_status` of the most recent entry, if any entry exists.
    pub async fn current_status(&self, report_id: Uuid) -> Result<Option<i32>> {
        let latest = sqlx::query_as::<_, StatusHistoryEntry>(&format!(
            "SELECT {} FROM status_history WHERE report_id = $1 \
             ORDER BY changed_at DESC, id DESC LIMIT 1",
            ENTRY_COLUMNS
        ))
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;
        Ok(latest.map(|e| e.to_status))
    }

    /// Full transition sequence, oldest first.
    pub async fn history(&self, report_id: Uuid) -> Result<Vec<StatusHistoryEntry>> {
        sqlx::query_as::<_, StatusHistoryEntry>(&format!(
            "SELECT {} FROM status_history WHERE report_id = $1 \
             ORDER BY changed_at ASC, id ASC",
            ENTRY_COLUMNS
        ))
        .bind(report_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    /// The most recent terminal entry, if the report has been resolved.
    pub async fn latest_finished(&self, report_id: Uuid) -> Result<Option<StatusHistoryEntry>> {
        sqlx::query_as::<_, StatusHistoryEntry>(&format!(
            "SELECT {} FROM status_history WHERE report_id = $1 AND finished \
             ORDER BY changed_at DESC, id DESC LIMIT 1",
            ENTRY_COLUMNS
        ))
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }
}
