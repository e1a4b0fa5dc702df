use std::sync::Arc;

use axum::{Router, routing::get};

use shared_config::AppConfig;

use crate::handlers;

pub fn employee_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_employees))
        .with_state(state)
}
