// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, patch},
};

use shared_config::AppConfig;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    // Operations that reach the backend forward the caller's bearer token
    let backend_routes = Router::new()
        .route("/", get(handlers::list_appointments).post(handlers::book_appointment))
        .route("/from-request", post(handlers::book_from_client_request))
        .route("/{appointment_id}/reschedule", patch(handlers::reschedule_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/conflicts/check", get(handlers::check_appointment_conflicts))
        .route("/availability", get(handlers::get_availability));

    let reference_routes = Router::new()
        .route("/types/normalize", get(handlers::normalize_appointment_type))
        .route("/states/legend", get(handlers::get_state_legend));

    Router::new()
        .merge(backend_routes)
        .merge(reference_routes)
        .with_state(state)
}
