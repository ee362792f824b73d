use std::sync::Arc;

use axum::{extract::State, Json};

use crate::core::error::Result;
use crate::features::statuses::dtos::{StatusListDto, StatusResponseDto};
use crate::features::statuses::services::StatusService;
use crate::shared::types::ApiResponse;

/// List active statuses a report can occupy
#[utoipa::path(
    get,
    path = "/statuses",
    responses(
        (status = 200, description = "Active statuses ordered by sort order", body = ApiResponse<StatusListDto>)
    ),
    tag = "statuses"
)]
pub async fn list_statuses(
    State(service): State<Arc<StatusService>>,
) -> Result<Json<ApiResponse<StatusListDto>>> {
    let statuses = service.list_active().await?;
    let dto = StatusListDto {
        statuses: statuses.into_iter().map(StatusResponseDto::from).collect(),
    };
    Ok(Json(ApiResponse::ok(dto)))
}
