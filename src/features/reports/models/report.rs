use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for a citizen-filed report.
///
/// `img` holds the media filename only; the directory is derived from the
/// row's own id. It is empty exactly during the window between row creation
/// and media attachment, and listing consumers filter on it.
#[derive(Debug, Clone, FromRow)]
pub struct Report {
    pub id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub detail: String,
    pub img: String,
    pub device_id: Option<String>,
    pub user_agent: Option<String>,
    pub category_id: Option<i32>,
    pub responsible: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Validated field set for creating a report row (media attached later).
#[derive(Debug, Clone)]
pub struct NewReport {
    pub lat: f64,
    pub lng: f64,
    pub detail: String,
    pub device_id: Option<String>,
    pub user_agent: Option<String>,
    pub category_id: Option<i32>,
}
