use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::statuses::models::Status;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusResponseDto {
    pub id: i32,
    pub code: String,
    pub label: String,
    pub sort_order: i32,
}

impl From<Status> for StatusResponseDto {
    fn from(s: Status) -> Self {
        Self {
            id: s.id,
            code: s.code,
            label: s.label,
            sort_order: s.sort_order,
        }
    }
}

/// Envelope payload for the status listing (`{"ok":true,"statuses":[…]}`).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusListDto {
    pub statuses: Vec<StatusResponseDto>,
}
