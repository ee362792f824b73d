use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::reports::models::{Report, StatusHistoryEntry};

/// Multipart form for `POST /report`. Documentation-only: the handler reads
/// the fields from the multipart stream directly.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitReportDto {
    /// Latitude in decimal degrees
    #[schema(example = -6.2088)]
    pub lat: f64,
    /// Longitude in decimal degrees
    #[schema(example = 106.8456)]
    pub lng: f64,
    /// Free-text description of the issue
    #[schema(example = "Streetlight out on the corner")]
    pub detail: String,
    /// Photo of the issue (image/jpeg, image/png or image/webp)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub img: String,
    /// Submitting device identifier
    pub device_id: Option<String>,
    /// Submitting client user agent
    pub user_agent: Option<String>,
    /// Issue category id
    pub category_id: Option<i32>,
}

/// Success payload for `POST /report` (`{"ok":true,"id":…}` once wrapped).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReportCreatedDto {
    pub id: Uuid,
}

/// Request body for `PUT /admin/report/{id}/status`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusDto {
    pub to_status_id: i32,
    #[validate(length(max = 2000, message = "note too long"))]
    pub note: Option<String>,
    #[validate(length(max = 200, message = "changedBy too long"))]
    pub changed_by: Option<String>,
}

/// Success payload for a status update.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdatedDto {
    pub report_id: Uuid,
}

/// Request body for `PUT /admin/choose-institution`. Ids arrive as strings
/// per the external contract and are parsed at the handler.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AssignInstitutionDto {
    #[validate(length(min = 1, message = "institution_id is required"))]
    pub institution_id: String,
    #[validate(length(min = 1, message = "report_id is required"))]
    pub report_id: String,
}

/// Success payload for assignment (`{"ok":true}` once wrapped).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssignedDto {}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportResponseDto {
    pub id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub detail: String,
    pub img: String,
    pub category_id: Option<i32>,
    pub responsible: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<Report> for ReportResponseDto {
    fn from(r: Report) -> Self {
        Self {
            id: r.id,
            lat: r.lat,
            lng: r.lng,
            detail: r.detail,
            img: r.img,
            category_id: r.category_id,
            responsible: r.responsible,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReportListDto {
    pub reports: Vec<ReportResponseDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntryDto {
    pub id: i64,
    pub from_status: Option<i32>,
    pub to_status: i32,
    pub changed_at: DateTime<Utc>,
    pub changed_by: Option<String>,
    pub finished: bool,
    pub finished_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

impl From<StatusHistoryEntry> for StatusHistoryEntryDto {
    fn from(e: StatusHistoryEntry) -> Self {
        Self {
            id: e.id,
            from_status: e.from_status,
            to_status: e.to_status,
            changed_at: e.changed_at,
            changed_by: e.changed_by,
            finished: e.finished,
            finished_at: e.finished_at,
            note: e.note,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusHistoryListDto {
    pub history: Vec<StatusHistoryEntryDto>,
}

/// Elapsed time between report creation and resolution, in several units.
/// All non-millisecond units are rounded to two decimals.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DurationDto {
    pub millis: i64,
    pub minutes: f64,
    pub hours: f64,
    pub days: f64,
    pub weeks: f64,
    pub months: f64,
    pub years: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_status_dto_uses_camel_case() {
        let dto: UpdateStatusDto = serde_json::from_str(
            r#"{"toStatusId": 2, "note": "crew dispatched", "changedBy": "staff-7"}"#,
        )
        .unwrap();
        assert_eq!(dto.to_status_id, 2);
        assert_eq!(dto.note.as_deref(), Some("crew dispatched"));
        assert_eq!(dto.changed_by.as_deref(), Some("staff-7"));
    }

    #[test]
    fn test_update_status_dto_requires_target() {
        let result = serde_json::from_str::<UpdateStatusDto>(r#"{"note": "x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_assign_dto_field_names_are_snake_case() {
        let dto: AssignInstitutionDto = serde_json::from_str(
            r#"{"institution_id": "inst-1", "report_id": "rep-1"}"#,
        )
        .unwrap();
        assert_eq!(dto.institution_id, "inst-1");
        assert_eq!(dto.report_id, "rep-1");
    }
}
