// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use shared_config::AppConfig;

use crate::models::{
    Appointment, AppointmentError, AppointmentId, AvailableSlot, BookFromClientRequest,
    BookingRequest, CancelRequest, ConflictCheckResponse, RescheduleChange, SlotCandidate,
    ValidatedBooking,
};
use crate::services::backend::{CitasApiBackend, CitasBackend};
use crate::services::conflict::OverlapDetector;
use crate::services::lifecycle::{AppointmentLifecycleService, LifecycleAction};
use crate::services::time_window::TimeWindowPolicy;
use crate::services::validator::{BookingMode, BookingValidator};

/// Filters for the appointment listing.
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub date: Option<NaiveDate>,
    pub employee_ref: Option<String>,
}

impl AppointmentFilter {
    fn matches(&self, appointment: &Appointment) -> bool {
        self.date.map_or(true, |date| appointment.date == date)
            && self
                .employee_ref
                .as_deref()
                .map_or(true, |employee| appointment.employee_ref.as_deref() == Some(employee))
    }
}

/// Orchestrates snapshot fetch, validation and the backend write for every
/// scheduling operation.
pub struct AppointmentBookingService {
    backend: Arc<dyn CitasBackend>,
    validator: BookingValidator,
    detector: OverlapDetector,
    lifecycle_service: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        let backend: Arc<dyn CitasBackend> = Arc::new(CitasApiBackend::new(config));
        Self::with_backend(backend, TimeWindowPolicy::from_config(config))
    }

    pub fn with_backend(backend: Arc<dyn CitasBackend>, policy: TimeWindowPolicy) -> Self {
        Self {
            backend,
            validator: BookingValidator::new(policy),
            detector: OverlapDetector::new(),
            lifecycle_service: AppointmentLifecycleService::new(),
        }
    }

    pub fn policy(&self) -> &TimeWindowPolicy {
        self.validator.policy()
    }

    pub async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Listing appointments with filter {:?}", filter);

        let mut appointments: Vec<Appointment> = self.backend
            .list_appointments(auth_token)
            .await?
            .into_iter()
            .filter(|apt| filter.matches(apt))
            .collect();

        appointments.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
        Ok(appointments)
    }

    pub async fn book_appointment(
        &self,
        request: BookingRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!("Booking appointment for client {:?} with employee {:?}", request.client_ref, request.employee_ref);

        let snapshot = self.backend.list_appointments(auth_token).await?;

        let booking = match self.validator.validate(&request, &BookingMode::Create, &snapshot)? {
            ValidatedBooking::Create(booking) => booking,
            ValidatedBooking::Reschedule(_) => {
                return Err(AppointmentError::BackendError("Unexpected reschedule payload".to_string()))
            }
        };

        let appointment = self.backend.create_appointment(&booking, auth_token).await?;

        info!("Appointment {} booked on {} {}-{}", appointment.id, appointment.date,
              appointment.start_time.format("%H:%M"), appointment.end_time.format("%H:%M"));
        Ok(appointment)
    }

    /// Book an appointment for a client's service request once the agency
    /// has chosen the slot and the employee.
    pub async fn book_from_client_request(
        &self,
        request: BookFromClientRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Booking from client request {:?}", request.client_request.request_ref);
        self.book_appointment(request.into_booking_request(), auth_token).await
    }

    pub async fn reschedule_appointment(
        &self,
        appointment_id: AppointmentId,
        request: BookingRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!("Rescheduling appointment {}", appointment_id);

        let snapshot = self.backend.list_appointments(auth_token).await?;
        let current = find_appointment(&snapshot, &appointment_id)?;

        let next_state = self.lifecycle_service
            .validate_transition(current.state, LifecycleAction::Reschedule)?;

        let mode = BookingMode::Reschedule { appointment_id };
        let change = match self.validator.validate(&request, &mode, &snapshot)? {
            ValidatedBooking::Reschedule(change) => RescheduleChange { state: next_state, ..change },
            ValidatedBooking::Create(_) => {
                return Err(AppointmentError::BackendError("Unexpected create payload".to_string()))
            }
        };

        let appointment = self.backend.reschedule_appointment(&change, auth_token).await?;

        info!("Appointment {} moved to {} {}", appointment.id, appointment.date,
              appointment.start_time.format("%H:%M"));
        Ok(appointment)
    }

    pub async fn cancel_appointment(
        &self,
        appointment_id: AppointmentId,
        request: CancelRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!("Cancelling appointment {}", appointment_id);

        let snapshot = self.backend.list_appointments(auth_token).await?;
        let current = find_appointment(&snapshot, &appointment_id)?;

        let note = self.lifecycle_service.validate_cancellation(current.state, &request)?;

        self.backend.cancel_appointment(&appointment_id, &note, auth_token).await
    }

    pub async fn check_conflicts(
        &self,
        candidate: &SlotCandidate,
        exclude_id: Option<&AppointmentId>,
        auth_token: &str,
    ) -> Result<ConflictCheckResponse, AppointmentError> {
        let snapshot = self.backend.list_appointments(auth_token).await?;

        let conflicting_ids: Vec<AppointmentId> = self.detector
            .find_conflicts(candidate, &snapshot, exclude_id)
            .into_iter()
            .map(|apt| apt.id.clone())
            .collect();

        Ok(ConflictCheckResponse {
            has_conflict: !conflicting_ids.is_empty(),
            conflicting_ids,
        })
    }

    pub async fn get_availability(
        &self,
        date: NaiveDate,
        employee_ref: Option<&str>,
        auth_token: &str,
    ) -> Result<Vec<AvailableSlot>, AppointmentError> {
        let snapshot = self.backend.list_appointments(auth_token).await?;
        let slots = self.detector.available_slots(self.policy(), date, employee_ref, &snapshot);

        debug!("{} free slots on {} for employee {:?}", slots.len(), date, employee_ref);
        Ok(slots)
    }
}

fn find_appointment<'a>(
    snapshot: &'a [Appointment],
    appointment_id: &AppointmentId,
) -> Result<&'a Appointment, AppointmentError> {
    snapshot
        .iter()
        .find(|apt| &apt.id == appointment_id)
        .ok_or_else(|| {
            warn!("Appointment {} not found in snapshot", appointment_id);
            AppointmentError::NotFound
        })
}
