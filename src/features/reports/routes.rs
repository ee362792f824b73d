use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::reports::handlers::{report_handler, ReportState};

/// Citizen-facing routes
pub fn public_routes(state: ReportState) -> Router {
    Router::new()
        .route("/report", post(report_handler::submit_report))
        .route("/reports", get(report_handler::list_reports))
        .with_state(state)
}

/// Staff routes (authentication is applied by an outer layer, out of scope
/// for this service)
pub fn admin_routes(state: ReportState) -> Router {
    Router::new()
        .route(
            "/admin/report/{id}/status",
            put(report_handler::update_report_status),
        )
        .route(
            "/admin/choose-institution",
            put(report_handler::choose_institution),
        )
        .route(
            "/admin/report/{id}/status-history",
            get(report_handler::get_status_history),
        )
        .route(
            "/admin/report/{id}/duration",
            get(report_handler::get_report_duration),
        )
        .with_state(state)
}
