use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::statuses::models::Status;

/// Lookup access to the statuses table, including the transition-target
/// check that runs before any ledger mutation.
pub struct StatusService {
    pool: PgPool,
}

impl StatusService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Confirm a candidate transition target exists and is reachable.
    /// Missing or inactive targets yield `InvalidTarget`, which the boundary
    /// maps to 400 rather than the 404 reserved for the report itself.
    pub async fn validate_target(&self, status_id: i32) -> Result<Status> {
        sqlx::query_as::<_, Status>(
            "SELECT id, code, label, sort_order, active FROM statuses WHERE id = $1 AND active",
        )
        .bind(status_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::InvalidTarget(format!("Unknown status id: {}", status_id)))
    }

    /// The status applied to every freshly ingested report: the active row
    /// with the lowest sort order.
    pub async fn initial_status(&self) -> Result<Status> {
        sqlx::query_as::<_, Status>(
            "SELECT id, code, label, sort_order, active FROM statuses \
             WHERE active ORDER BY sort_order ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::Internal("No active statuses configured".to_string()))
    }

    pub async fn list_active(&self) -> Result<Vec<Status>> {
        sqlx::query_as::<_, Status>(
            "SELECT id, code, label, sort_order, active FROM statuses \
             WHERE active ORDER BY sort_order ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }
}
