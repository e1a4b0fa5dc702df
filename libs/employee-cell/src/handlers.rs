use std::sync::Arc;

use axum::{extract::State, Json};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::EmployeeError;
use crate::services::directory::EmployeeService;

#[axum::debug_handler]
pub async fn list_employees(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let employee_service = EmployeeService::new(&state);

    let employees = employee_service.list_active_employees(auth.token()).await
        .map_err(|e| match e {
            EmployeeError::NotFound => AppError::NotFound("Employee directory not found".to_string()),
            EmployeeError::UnauthorizedAccess => AppError::Auth("Unauthorized access to employee data".to_string()),
            EmployeeError::BackendError(msg) => AppError::ExternalService(msg),
        })?;

    Ok(Json(json!({
        "employees": employees,
        "total": employees.len()
    })))
}
