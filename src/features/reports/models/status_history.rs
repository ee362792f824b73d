use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// One immutable transition record in a report's status ledger.
/// Rows are append-only; nothing in this crate updates or deletes them.
/// `from_status` is NULL only on a report's first entry.
#[derive(Debug, Clone, FromRow)]
pub struct StatusHistoryEntry {
    pub id: i64,
    pub report_id: Uuid,
    pub from_status: Option<i32>,
    pub to_status: i32,
    pub changed_at: DateTime<Utc>,
    pub changed_by: Option<String>,
    pub media_before: Option<String>,
    pub media_after: Option<String>,
    pub finished: bool,
    pub finished_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

impl StatusHistoryEntry {
    /// The instant the report counts as resolved: `finished_at` when set,
    /// otherwise the entry's own change time.
    pub fn resolution_instant(&self) -> DateTime<Utc> {
        self.finished_at.unwrap_or(self.changed_at)
    }
}
