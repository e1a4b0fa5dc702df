// libs/appointment-cell/src/services/backend.rs
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::{ApiClient, ApiError};

use crate::models::{
    Appointment, AppointmentError, AppointmentId, FieldErrorMap, NewAppointment, RescheduleChange,
};

/// Remote appointment store. Implementations are responsible for mapping the
/// backend's own field names to the canonical `Appointment` shape and for
/// reporting server-side conflicts as a `SchedulingConflict`.
#[async_trait]
pub trait CitasBackend: Send + Sync {
    async fn list_appointments(&self, auth_token: &str) -> Result<Vec<Appointment>, AppointmentError>;

    async fn create_appointment(
        &self,
        booking: &NewAppointment,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError>;

    async fn reschedule_appointment(
        &self,
        change: &RescheduleChange,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError>;

    async fn cancel_appointment(
        &self,
        appointment_id: &AppointmentId,
        note: &str,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError>;
}

/// `CitasBackend` over the agency REST API.
pub struct CitasApiBackend {
    client: Arc<ApiClient>,
}

impl CitasApiBackend {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Arc::new(ApiClient::new(config)),
        }
    }

    fn map_error(error: anyhow::Error) -> AppointmentError {
        match error.downcast_ref::<ApiError>() {
            Some(ApiError::Conflict(body)) => {
                warn!("Backend rejected booking with a conflict: {}", body);
                FieldErrorMap::conflict(None).into()
            }
            Some(ApiError::NotFound(_)) => AppointmentError::NotFound,
            Some(ApiError::Unauthorized(_)) => AppointmentError::Unauthorized,
            _ => AppointmentError::BackendError(error.to_string()),
        }
    }

    // Write endpoints answer with the stored row, sometimes wrapped in an array.
    fn parse_record(value: Value) -> Result<Appointment, AppointmentError> {
        let record = match value {
            Value::Array(mut rows) if !rows.is_empty() => rows.swap_remove(0),
            Value::Array(_) => {
                return Err(AppointmentError::BackendError("Backend returned no record".to_string()))
            }
            other => other,
        };

        serde_json::from_value(record)
            .map_err(|e| AppointmentError::BackendError(format!("Failed to parse appointment: {}", e)))
    }
}

#[async_trait]
impl CitasBackend for CitasApiBackend {
    async fn list_appointments(&self, auth_token: &str) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Fetching appointment snapshot");

        let result: Vec<Value> = self.client
            .request(Method::GET, "/citas", Some(auth_token), None)
            .await
            .map_err(Self::map_error)?;

        let mut appointments = Vec::with_capacity(result.len());
        for row in result {
            match serde_json::from_value::<Appointment>(row) {
                Ok(appointment) => appointments.push(appointment),
                // A malformed row must not hide the rest of the calendar
                Err(e) => warn!("Skipping unparseable appointment row: {}", e),
            }
        }

        debug!("Snapshot contains {} appointments", appointments.len());
        Ok(appointments)
    }

    async fn create_appointment(
        &self,
        booking: &NewAppointment,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Creating appointment for client {} with employee {}", booking.client_ref, booking.employee_ref);

        let body = json!({
            "fecha": booking.date.format("%Y-%m-%d").to_string(),
            "hora_inicio": booking.start_time.format("%H:%M:%S").to_string(),
            "hora_fin": booking.end_time.format("%H:%M:%S").to_string(),
            "tipo": booking.appointment_type.label(),
            "modalidad": booking.modality.label(),
            "id_cliente": booking.client_ref,
            "id_empleado": booking.employee_ref,
            "observacion": booking.note,
        });

        let result: Value = self.client
            .request(Method::POST, "/citas", Some(auth_token), Some(body))
            .await
            .map_err(Self::map_error)?;

        Self::parse_record(result)
    }

    async fn reschedule_appointment(
        &self,
        change: &RescheduleChange,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Rescheduling appointment {}", change.appointment_id);

        let mut body = json!({
            "fecha": change.date.format("%Y-%m-%d").to_string(),
            "hora_inicio": change.start_time.format("%H:%M:%S").to_string(),
            "hora_fin": change.end_time.format("%H:%M:%S").to_string(),
            "observacion": change.note,
            "estado": change.state.display().label,
        });
        if let Some(employee_ref) = &change.employee_ref {
            body["id_empleado"] = json!(employee_ref);
        }

        let path = format!("/citas/{}/reprogramar", change.appointment_id);
        let result: Value = self.client
            .request(Method::PATCH, &path, Some(auth_token), Some(body))
            .await
            .map_err(Self::map_error)?;

        Self::parse_record(result)
    }

    async fn cancel_appointment(
        &self,
        appointment_id: &AppointmentId,
        note: &str,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Cancelling appointment {}", appointment_id);

        let path = format!("/citas/{}/anular", appointment_id);
        let result: Value = self.client
            .request(Method::PATCH, &path, Some(auth_token), Some(json!({ "observacion": note })))
            .await
            .map_err(Self::map_error)?;

        Self::parse_record(result)
    }
}
