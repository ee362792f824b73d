use utoipa::{Modify, OpenApi};

use crate::features::reports::{dtos as reports_dtos, handlers as reports_handlers};
use crate::features::statuses::{dtos as statuses_dtos, handlers as statuses_handlers};
use crate::shared::types::ApiResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Reports (public)
        reports_handlers::report_handler::submit_report,
        reports_handlers::report_handler::list_reports,
        // Reports (admin)
        reports_handlers::report_handler::update_report_status,
        reports_handlers::report_handler::choose_institution,
        reports_handlers::report_handler::get_status_history,
        reports_handlers::report_handler::get_report_duration,
        // Statuses
        statuses_handlers::status_handler::list_statuses,
    ),
    components(
        schemas(
            // Reports
            reports_dtos::SubmitReportDto,
            reports_dtos::ReportCreatedDto,
            reports_dtos::ReportResponseDto,
            reports_dtos::ReportListDto,
            reports_dtos::UpdateStatusDto,
            reports_dtos::StatusUpdatedDto,
            reports_dtos::AssignInstitutionDto,
            reports_dtos::AssignedDto,
            reports_dtos::StatusHistoryEntryDto,
            reports_dtos::StatusHistoryListDto,
            reports_dtos::DurationDto,
            ApiResponse<reports_dtos::ReportCreatedDto>,
            ApiResponse<reports_dtos::ReportListDto>,
            ApiResponse<reports_dtos::StatusUpdatedDto>,
            ApiResponse<reports_dtos::AssignedDto>,
            ApiResponse<reports_dtos::StatusHistoryListDto>,
            ApiResponse<reports_dtos::DurationDto>,
            // Statuses
            statuses_dtos::StatusResponseDto,
            statuses_dtos::StatusListDto,
            ApiResponse<statuses_dtos::StatusListDto>,
        )
    ),
    tags(
        (name = "reports", description = "Citizen report intake and handling"),
        (name = "statuses", description = "Report handling statuses"),
    ),
    info(
        title = "CivicSignal API",
        version = "0.1.0",
        description = "Citizen issue report ingestion and status tracking",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
