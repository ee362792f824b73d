use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::institutions::services::InstitutionService;
use crate::features::reports::dtos::{
    AssignInstitutionDto, AssignedDto, DurationDto, ReportCreatedDto, ReportListDto,
    ReportResponseDto, StatusHistoryEntryDto, StatusHistoryListDto, StatusUpdatedDto,
    SubmitReportDto, UpdateStatusDto,
};
use crate::features::reports::models::NewReport;
use crate::features::reports::services::{duration, IngestionService, LedgerService, ReportService};
use crate::features::statuses::services::StatusService;
use crate::modules::storage::StagedUpload;
use crate::shared::types::ApiResponse;
use crate::shared::validation::{valid_detail, valid_latitude, valid_longitude};

/// State for report handlers
#[derive(Clone)]
pub struct ReportState {
    pub ingestion: Arc<IngestionService>,
    pub reports: Arc<ReportService>,
    pub ledger: Arc<LedgerService>,
    pub statuses: Arc<StatusService>,
    pub institutions: Arc<InstitutionService>,
    /// Seam: record assignments as same-status ledger entries.
    pub assignment_ledger_entry: bool,
}

/// Raw multipart fields collected before validation. The media stream is
/// staged while the request is still being read; validation runs afterwards
/// and discards the staged file on failure.
#[derive(Default)]
struct SubmissionFields {
    lat: Option<String>,
    lng: Option<String>,
    detail: Option<String>,
    device_id: Option<String>,
    user_agent: Option<String>,
    category_id: Option<String>,
    staged: Option<StagedUpload>,
    media_rejected: bool,
}

async fn drain_field(field: &mut axum::extract::multipart::Field<'_>) {
    // Keep the multipart framing intact; the bytes are dropped.
    while let Ok(Some(_)) = field.chunk().await {}
}

/// Reads the whole multipart request. A staged file never outlives a
/// failed read: any error after the media field has been staged removes
/// the staged file before propagating.
async fn collect_submission(
    state: &ReportState,
    multipart: &mut Multipart,
) -> Result<SubmissionFields> {
    let mut fields = SubmissionFields::default();
    match read_fields(state, multipart, &mut fields).await {
        Ok(()) => Ok(fields),
        Err(e) => {
            if let Some(staged) = &fields.staged {
                state.ingestion.stager().discard(staged).await;
            }
            Err(e)
        }
    }
}

async fn read_fields(
    state: &ReportState,
    multipart: &mut Multipart,
    fields: &mut SubmissionFields,
) -> Result<()> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart data: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "img" => {
                if fields.staged.is_some() {
                    drain_field(&mut field).await;
                    continue;
                }
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let file_name = field.file_name().map(str::to_string);

                match state
                    .ingestion
                    .stager()
                    .begin(file_name.as_deref(), &content_type)
                    .await
                {
                    Ok(mut write) => {
                        let mut failed: Option<AppError> = None;
                        loop {
                            match field.chunk().await {
                                Ok(Some(chunk)) => {
                                    if let Err(e) = write.write_chunk(&chunk).await {
                                        failed = Some(e);
                                        break;
                                    }
                                }
                                Ok(None) => break,
                                Err(e) => {
                                    failed = Some(AppError::BadRequest(format!(
                                        "Failed to read upload stream: {}",
                                        e
                                    )));
                                    break;
                                }
                            }
                        }
                        match failed {
                            Some(e) => {
                                write.abort().await;
                                return Err(e);
                            }
                            None => fields.staged = Some(write.finish().await?),
                        }
                    }
                    Err(AppError::Validation(_)) => {
                        // Disallowed content type: drain without persisting.
                        fields.media_rejected = true;
                        drain_field(&mut field).await;
                    }
                    Err(e) => return Err(e),
                }
            }
            other => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read field {}: {}", other, e))
                })?;
                match other {
                    "lat" => fields.lat = Some(text),
                    "lng" => fields.lng = Some(text),
                    "detail" => fields.detail = Some(text),
                    "device_id" => fields.device_id = Some(text),
                    "user_agent" => fields.user_agent = Some(text),
                    "category_id" => fields.category_id = Some(text),
                    _ => {}
                }
            }
        }
    }

    Ok(())
}

/// Submit a citizen report with a photo
#[utoipa::path(
    post,
    path = "/report",
    request_body(
        content = SubmitReportDto,
        content_type = "multipart/form-data",
        description = "Report fields plus the photo file field img",
    ),
    responses(
        (status = 201, description = "Report created", body = ApiResponse<ReportCreatedDto>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 500, description = "Server fault")
    ),
    tag = "reports"
)]
pub async fn submit_report(
    State(state): State<ReportState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ReportCreatedDto>>)> {
    let fields = collect_submission(&state, &mut multipart).await?;

    let lat = fields.lat.as_deref().and_then(|s| s.trim().parse::<f64>().ok());
    let lng = fields.lng.as_deref().and_then(|s| s.trim().parse::<f64>().ok());
    let category_id = match fields.category_id.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse::<i32>().map(Some).map_err(|_| ()),
    };

    let mut invalid: Vec<&str> = Vec::new();
    if !lat.is_some_and(valid_latitude) {
        invalid.push("lat");
    }
    if !lng.is_some_and(valid_longitude) {
        invalid.push("lng");
    }
    if !fields.detail.as_deref().is_some_and(valid_detail) {
        invalid.push("detail");
    }
    if category_id.is_err() {
        invalid.push("category_id");
    }
    if fields.staged.is_none() || fields.media_rejected {
        invalid.push("img");
    }

    if !invalid.is_empty() {
        // A file may already be staged when a later field turns out invalid;
        // it must be gone before the 400 leaves.
        if let Some(staged) = &fields.staged {
            state.ingestion.stager().discard(staged).await;
        }
        return Err(AppError::Validation(format!(
            "Missing/invalid fields: {}",
            invalid.join(", ")
        )));
    }

    let data = NewReport {
        lat: lat.unwrap(),
        lng: lng.unwrap(),
        detail: fields.detail.unwrap(),
        device_id: fields.device_id.filter(|s| !s.is_empty()),
        user_agent: fields.user_agent.filter(|s| !s.is_empty()),
        category_id: category_id.unwrap(),
    };

    let id = state.ingestion.ingest(data, fields.staged.unwrap()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(ReportCreatedDto { id })),
    ))
}

/// Move a report to a new handling status
#[utoipa::path(
    put,
    path = "/admin/report/{id}/status",
    params(("id" = Uuid, Path, description = "Report ID")),
    request_body = UpdateStatusDto,
    responses(
        (status = 200, description = "Transition recorded", body = ApiResponse<StatusUpdatedDto>),
        (status = 400, description = "Unknown or missing target status"),
        (status = 404, description = "Report not found"),
        (status = 409, description = "Report already resolved")
    ),
    tag = "reports"
)]
pub async fn update_report_status(
    State(state): State<ReportState>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateStatusDto>,
) -> Result<Json<ApiResponse<StatusUpdatedDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    // Target check runs before any mutation is attempted.
    let target = state.statuses.validate_target(dto.to_status_id).await?;
    state
        .ledger
        .append_transition(id, &target, dto.note.as_deref(), dto.changed_by.as_deref())
        .await?;

    Ok(Json(ApiResponse::ok(StatusUpdatedDto { report_id: id })))
}

/// Assign the institution responsible for a report
#[utoipa::path(
    put,
    path = "/admin/choose-institution",
    request_body = AssignInstitutionDto,
    responses(
        (status = 200, description = "Report assigned", body = ApiResponse<AssignedDto>),
        (status = 400, description = "Missing fields"),
        (status = 404, description = "Unknown institution or report")
    ),
    tag = "reports"
)]
pub async fn choose_institution(
    State(state): State<ReportState>,
    AppJson(dto): AppJson<AssignInstitutionDto>,
) -> Result<Json<ApiResponse<AssignedDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let institution_id = Uuid::parse_str(dto.institution_id.trim())
        .map_err(|_| AppError::NotFound(format!("Institution {} not found", dto.institution_id)))?;
    let report_id = Uuid::parse_str(dto.report_id.trim())
        .map_err(|_| AppError::NotFound(format!("Report {} not found", dto.report_id)))?;

    let institution = state.institutions.get_active(institution_id).await?;
    state
        .reports
        .assign_responsible(report_id, institution.id)
        .await?;

    if state.assignment_ledger_entry {
        record_assignment_entry(&state, report_id, &institution.name).await?;
    }

    Ok(Json(ApiResponse::ok(AssignedDto {})))
}

/// Optional seam: mirror the assignment into the ledger as a same-status
/// entry. Skipped when the report has no status yet, when its current
/// status is no longer reachable, or when it is terminal.
async fn record_assignment_entry(
    state: &ReportState,
    report_id: Uuid,
    institution_name: &str,
) -> Result<()> {
    let Some(current) = state.ledger.current_status(report_id).await? else {
        return Ok(());
    };
    match state.statuses.validate_target(current).await {
        Ok(target) if !target.is_terminal() => {
            let note = format!("Assigned to {}", institution_name);
            state
                .ledger
                .append_transition(report_id, &target, Some(&note), None)
                .await?;
        }
        Ok(_) => {}
        Err(AppError::InvalidTarget(_)) => {
            tracing::warn!(
                report_id = %report_id,
                status = current,
                "skipping assignment ledger entry; current status not reachable"
            );
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

/// Status transition history for a report, oldest first
#[utoipa::path(
    get,
    path = "/admin/report/{id}/status-history",
    params(("id" = Uuid, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Transition history", body = ApiResponse<StatusHistoryListDto>),
        (status = 404, description = "Report not found")
    ),
    tag = "reports"
)]
pub async fn get_status_history(
    State(state): State<ReportState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<StatusHistoryListDto>>> {
    state.reports.get_by_id(id).await?;
    let history = state.ledger.history(id).await?;
    let dto = StatusHistoryListDto {
        history: history.into_iter().map(StatusHistoryEntryDto::from).collect(),
    };
    Ok(Json(ApiResponse::ok(dto)))
}

/// Time from report creation to resolution
#[utoipa::path(
    get,
    path = "/admin/report/{id}/duration",
    params(("id" = Uuid, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Elapsed time in several units", body = ApiResponse<DurationDto>),
        (status = 404, description = "Report not found or not resolved")
    ),
    tag = "reports"
)]
pub async fn get_report_duration(
    State(state): State<ReportState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DurationDto>>> {
    let report = state.reports.get_by_id(id).await?;
    let entry = state
        .ledger
        .latest_finished(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {} is not resolved", id)))?;

    let dto = duration::elapsed_between(report.created_at, entry.resolution_instant());
    Ok(Json(ApiResponse::ok(dto)))
}

/// List reports with attached media
#[utoipa::path(
    get,
    path = "/reports",
    responses(
        (status = 200, description = "Visible reports, newest first", body = ApiResponse<ReportListDto>)
    ),
    tag = "reports"
)]
pub async fn list_reports(
    State(state): State<ReportState>,
) -> Result<Json<ApiResponse<ReportListDto>>> {
    let reports = state.reports.list_visible().await?;
    let dto = ReportListDto {
        reports: reports.into_iter().map(ReportResponseDto::from).collect(),
    };
    Ok(Json(ApiResponse::ok(dto)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reports::routes;
    use crate::modules::storage::{MediaRelocator, UploadStager};
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use sqlx::postgres::PgPoolOptions;
    use std::path::Path as FsPath;

    // A lazy pool never connects; these tests only exercise paths that fail
    // before any query runs.
    fn test_state(uploads_root: &FsPath) -> ReportState {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/unreachable")
            .unwrap();
        let stager = Arc::new(UploadStager::new(uploads_root));
        let relocator = Arc::new(MediaRelocator::new(uploads_root));
        let reports = Arc::new(ReportService::new(pool.clone()));
        let ledger = Arc::new(LedgerService::new(pool.clone()));
        let statuses = Arc::new(StatusService::new(pool.clone()));
        let institutions = Arc::new(InstitutionService::new(pool.clone()));
        ReportState {
            ingestion: Arc::new(IngestionService::new(
                pool,
                stager,
                relocator,
                Arc::clone(&reports),
                Arc::clone(&ledger),
                Arc::clone(&statuses),
            )),
            reports,
            ledger,
            statuses,
            institutions,
            assignment_ledger_entry: false,
        }
    }

    fn staging_file_count(uploads_root: &FsPath) -> usize {
        let staging = uploads_root.join("reports");
        if !staging.exists() {
            return 0;
        }
        std::fs::read_dir(staging).unwrap().count()
    }

    fn jpeg_part() -> Part {
        Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10])
            .file_name("pothole.jpg")
            .mime_type("image/jpeg")
    }

    #[tokio::test]
    async fn test_submit_with_no_fields_lists_all_missing() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::new(routes::public_routes(test_state(dir.path()))).unwrap();

        let form = MultipartForm::new().add_text("device_id", "dev-1");
        let response = server.post("/report").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["ok"], false);
        let message = body["error"].as_str().unwrap();
        assert!(message.starts_with("Missing/invalid fields:"));
        for field in ["lat", "lng", "detail", "img"] {
            assert!(message.contains(field), "message should name {}", field);
        }
        assert_eq!(staging_file_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_submit_with_disallowed_media_type_is_400_and_unpersisted() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::new(routes::public_routes(test_state(dir.path()))).unwrap();

        let form = MultipartForm::new()
            .add_text("lat", "13.7")
            .add_text("lng", "100.5")
            .add_text("detail", "pothole")
            .add_part(
                "img",
                Part::bytes(b"GIF89a".to_vec())
                    .file_name("anim.gif")
                    .mime_type("image/gif"),
            );
        let response = server.post("/report").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("img"));
        assert_eq!(staging_file_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_invalid_coordinates_discard_staged_file_idempotently() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::new(routes::public_routes(test_state(dir.path()))).unwrap();

        // Same invalid payload twice: identical responses, zero residue.
        for _ in 0..2 {
            let form = MultipartForm::new()
                .add_text("lat", "95.0")
                .add_text("lng", "100.5")
                .add_text("detail", "pothole")
                .add_part("img", jpeg_part());
            let response = server.post("/report").multipart(form).await;

            response.assert_status(StatusCode::BAD_REQUEST);
            let body: serde_json::Value = response.json();
            assert_eq!(
                body["error"].as_str().unwrap(),
                "Missing/invalid fields: lat"
            );
            assert_eq!(staging_file_count(dir.path()), 0);
        }
    }

    #[tokio::test]
    async fn test_truncated_stream_after_photo_leaves_no_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::new(routes::public_routes(test_state(dir.path()))).unwrap();

        // Complete img part, then a field cut off before the closing
        // boundary. The read fails after the photo is already staged.
        let body = concat!(
            "--B\r\n",
            "Content-Disposition: form-data; name=\"img\"; filename=\"p.jpg\"\r\n",
            "Content-Type: image/jpeg\r\n",
            "\r\n",
            "jpeg-bytes\r\n",
            "--B\r\n",
            "Content-Disposition: form-data; name=\"lat\"\r\n",
            "\r\n",
            "13.7"
        );
        let response = server
            .post("/report")
            .content_type("multipart/form-data; boundary=B")
            .bytes(body.as_bytes().to_vec().into())
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(staging_file_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_blank_detail_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::new(routes::public_routes(test_state(dir.path()))).unwrap();

        let form = MultipartForm::new()
            .add_text("lat", "13.7")
            .add_text("lng", "100.5")
            .add_text("detail", "   ")
            .add_part("img", jpeg_part());
        let response = server.post("/report").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(
            body["error"].as_str().unwrap(),
            "Missing/invalid fields: detail"
        );
        assert_eq!(staging_file_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_status_update_requires_target_field() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::new(routes::admin_routes(test_state(dir.path()))).unwrap();

        let response = server
            .put(&format!("/admin/report/{}/status", Uuid::new_v4()))
            .json(&serde_json::json!({ "note": "no target" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn test_choose_institution_requires_both_fields() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::new(routes::admin_routes(test_state(dir.path()))).unwrap();

        let response = server
            .put("/admin/choose-institution")
            .json(&serde_json::json!({ "institution_id": "", "report_id": "" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_choose_institution_malformed_ids_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::new(routes::admin_routes(test_state(dir.path()))).unwrap();

        let response = server
            .put("/admin/choose-institution")
            .json(&serde_json::json!({
                "institution_id": "not-a-uuid",
                "report_id": "also-not-a-uuid"
            }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}
