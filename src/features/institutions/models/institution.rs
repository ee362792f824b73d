use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// An institution that can be made responsible for handling a report.
/// Managed elsewhere; this subsystem only reads it during assignment.
#[derive(Debug, Clone, FromRow)]
pub struct Institution {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}
