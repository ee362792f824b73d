use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::institutions::models::Institution;

pub struct InstitutionService {
    pool: PgPool,
}

impl InstitutionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Unknown or inactive institutions are a 404 on assignment.
    pub async fn get_active(&self, id: Uuid) -> Result<Institution> {
        sqlx::query_as::<_, Institution>(
            "SELECT id, name, active, created_at FROM institutions WHERE id = $1 AND active",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound(format!("Institution {} not found", id)))
    }
}
