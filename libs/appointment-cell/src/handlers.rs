// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{Authorization, authorization::Bearer};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, AppointmentId, BookFromClientRequest, BookingRequest, CancelRequest,
    SlotCandidate,
};
use crate::services::booking::{AppointmentBookingService, AppointmentFilter};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::normalizer::normalize_type;
use crate::services::time_window::parse_time_of_day;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AppointmentQueryParams {
    pub date: Option<NaiveDate>,
    pub employee_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConflictCheckQuery {
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub employee_ref: Option<String>,
    pub exclude_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub employee_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NormalizeTypeQuery {
    pub raw: Option<String>,
}

fn map_appointment_error(error: AppointmentError) -> AppError {
    match error {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::InvalidStateTransition(state) => {
            AppError::BadRequest(format!("Appointment cannot be modified in current state: {}", state))
        }
        AppointmentError::Validation(errors) if errors.is_conflict() => {
            AppError::Conflict(errors.to_string())
        }
        AppointmentError::Validation(errors) => AppError::ValidationError {
            message: errors.to_string(),
            fields: errors.messages(),
        },
        AppointmentError::Unauthorized => {
            AppError::Auth("Not authorized to access appointments".to_string())
        }
        AppointmentError::BackendError(msg) => AppError::ExternalService(msg),
    }
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<AppointmentQueryParams>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);

    let filter = AppointmentFilter {
        date: params.date,
        employee_ref: params.employee_ref,
    };

    let appointments = booking_service.list_appointments(&filter, auth.token()).await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service.book_appointment(request, auth.token()).await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn book_from_client_request(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<BookFromClientRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);
    let request_ref = request.client_request.request_ref.clone();

    let appointment = booking_service.book_from_client_request(request, auth.token()).await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "request_ref": request_ref,
        "message": "Appointment booked from client request"
    })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service
        .reschedule_appointment(AppointmentId::new(appointment_id), request, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment rescheduled successfully"
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CancelRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service
        .cancel_appointment(AppointmentId::new(appointment_id), request, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled successfully"
    })))
}

// ==============================================================================
// UTILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn check_appointment_conflicts(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<ConflictCheckQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let start_time = parse_time_of_day(&query.start_time)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid start_time: {}", query.start_time)))?;
    let end_time = parse_time_of_day(&query.end_time)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid end_time: {}", query.end_time)))?;

    let booking_service = AppointmentBookingService::new(&state);
    booking_service
        .policy()
        .validate_range(start_time, end_time)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let candidate = SlotCandidate {
        date: query.date,
        start_time,
        end_time,
        employee_ref: query.employee_ref.filter(|e| !e.trim().is_empty()),
    };
    let exclude_id = query.exclude_id.map(AppointmentId::new);

    let result = booking_service
        .check_conflicts(&candidate, exclude_id.as_ref(), auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(result)))
}

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<AvailabilityQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);

    let slots = booking_service
        .get_availability(query.date, query.employee_ref.as_deref(), auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "date": query.date,
        "employee_ref": query.employee_ref,
        "slots": slots
    })))
}

pub async fn normalize_appointment_type(
    Query(query): Query<NormalizeTypeQuery>,
) -> Json<Value> {
    let canonical = normalize_type(query.raw.as_deref().unwrap_or_default());

    Json(json!({
        "type": canonical,
        "label": canonical.label()
    }))
}

pub async fn get_state_legend() -> Json<Value> {
    Json(json!({
        "states": AppointmentLifecycleService::new().legend()
    }))
}
