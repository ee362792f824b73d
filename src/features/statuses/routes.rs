use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::statuses::handlers;
use crate::features::statuses::services::StatusService;

pub fn routes(service: Arc<StatusService>) -> Router {
    Router::new()
        .route("/statuses", get(handlers::list_statuses))
        .with_state(service)
}
