use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::appointment_routes;
use employee_cell::router::employee_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Agency scheduling API is running!" }))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/employees", employee_routes(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{Request, StatusCode}};
    use shared_utils::test_utils::TestConfig;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_root_and_nested_routes() {
        let app = create_router(TestConfig::default().to_arc());

        let root = app.clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(root.status(), StatusCode::OK);

        let legend = app
            .oneshot(Request::builder().uri("/appointments/states/legend").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(legend.status(), StatusCode::OK);
    }
}
