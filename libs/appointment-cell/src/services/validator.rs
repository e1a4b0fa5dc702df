// libs/appointment-cell/src/services/validator.rs
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::models::{
    fields, Appointment, AppointmentId, AppointmentState, BookingError, BookingRequest,
    FieldErrorMap, NewAppointment, RescheduleChange, SlotCandidate, ValidatedBooking,
};
use crate::services::conflict::OverlapDetector;
use crate::services::normalizer::{normalize_modality, normalize_type};
use crate::services::time_window::{parse_time_of_day, RangeError, TimeWindowPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingMode {
    Create,
    Reschedule { appointment_id: AppointmentId },
}

impl BookingMode {
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            BookingMode::Create => &[
                fields::CLIENT_REF,
                fields::EMPLOYEE_REF,
                fields::TYPE,
                fields::START_TIME,
                fields::END_TIME,
                fields::DATE,
            ],
            BookingMode::Reschedule { .. } => &[fields::DATE, fields::START_TIME, fields::END_TIME],
        }
    }

    fn exclude_id(&self) -> Option<&AppointmentId> {
        match self {
            BookingMode::Create => None,
            BookingMode::Reschedule { appointment_id } => Some(appointment_id),
        }
    }
}

/// Decides whether a create/reschedule request is admissible against a
/// snapshot of known appointments. Pure: the caller persists the result.
#[derive(Debug, Clone, Default)]
pub struct BookingValidator {
    policy: TimeWindowPolicy,
    detector: OverlapDetector,
}

impl BookingValidator {
    pub fn new(policy: TimeWindowPolicy) -> Self {
        Self {
            policy,
            detector: OverlapDetector::new(),
        }
    }

    pub fn policy(&self) -> &TimeWindowPolicy {
        &self.policy
    }

    /// Field checks first (all collected), then the business window, then
    /// overlap. Only the first failing phase is reported.
    pub fn validate(
        &self,
        request: &BookingRequest,
        mode: &BookingMode,
        existing: &[Appointment],
    ) -> Result<ValidatedBooking, FieldErrorMap> {
        debug!("Validating {:?} booking request", mode);

        let mut errors = FieldErrorMap::new();

        for field in mode.required_fields() {
            if field_value(request, field).is_none() {
                errors.insert(field, BookingError::MissingField(field.to_string()));
            }
        }

        let date = parse_field(&mut errors, fields::DATE, request.date.as_deref(), |raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
        });
        let start_time = parse_field(&mut errors, fields::START_TIME, request.start_time.as_deref(), parse_time_of_day);
        let end_time = parse_field(&mut errors, fields::END_TIME, request.end_time.as_deref(), parse_time_of_day);

        let appointment_type = present(request.appointment_type.as_deref()).map(normalize_type);
        if *mode == BookingMode::Create && appointment_type.is_some_and(|t| !t.is_specified()) {
            errors.insert(fields::TYPE, BookingError::UnknownType);
        }

        let (date, start_time, end_time) = match (date, start_time, end_time) {
            (Some(date), Some(start), Some(end)) if errors.is_empty() => (date, start, end),
            _ => {
                warn!("Booking request rejected with {} field errors", errors.len());
                return Err(errors);
            }
        };

        self.policy
            .validate_range(start_time, end_time)
            .map_err(|e| {
                let field = match e {
                    RangeError::OutOfWindow(time) if time == start_time => fields::START_TIME,
                    _ => fields::END_TIME,
                };
                FieldErrorMap::single(field, e.into())
            })?;

        let employee_ref = present(request.employee_ref.as_deref())
            .map(str::to_string)
            .or_else(|| carried_over_employee(mode, existing));

        let candidate = SlotCandidate {
            date,
            start_time,
            end_time,
            employee_ref: employee_ref.clone(),
        };

        if let Some(conflicting) = self
            .detector
            .find_conflicts(&candidate, existing, mode.exclude_id())
            .first()
        {
            return Err(FieldErrorMap::conflict(Some(conflicting.id.clone())));
        }

        let note = request.note.clone();

        let validated = match mode {
            BookingMode::Create => ValidatedBooking::Create(NewAppointment {
                date,
                start_time,
                end_time,
                appointment_type: appointment_type.unwrap_or_default(),
                modality: normalize_modality(request.modality.as_deref().unwrap_or_default()),
                client_ref: present(request.client_ref.as_deref()).unwrap_or_default().to_string(),
                employee_ref: employee_ref.unwrap_or_default(),
                note,
            }),
            BookingMode::Reschedule { appointment_id } => ValidatedBooking::Reschedule(RescheduleChange {
                appointment_id: appointment_id.clone(),
                date,
                start_time,
                end_time,
                note,
                employee_ref,
                state: AppointmentState::Rescheduled,
            }),
        };

        debug!("Booking request validated for {} {}-{}", date, start_time, end_time);
        Ok(validated)
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn field_value<'r>(request: &'r BookingRequest, field: &str) -> Option<&'r str> {
    let value = match field {
        fields::DATE => request.date.as_deref(),
        fields::START_TIME => request.start_time.as_deref(),
        fields::END_TIME => request.end_time.as_deref(),
        fields::TYPE => request.appointment_type.as_deref(),
        fields::MODALITY => request.modality.as_deref(),
        fields::CLIENT_REF => request.client_ref.as_deref(),
        fields::EMPLOYEE_REF => request.employee_ref.as_deref(),
        fields::NOTE => request.note.as_deref(),
        _ => None,
    };
    present(value)
}

// Format errors are only reported for values that are present.
fn parse_field<T>(
    errors: &mut FieldErrorMap,
    field: &str,
    raw: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = present(raw)?;
    let parsed = parse(raw);
    if parsed.is_none() {
        errors.insert(
            field,
            BookingError::InvalidFormat {
                field: field.to_string(),
                value: raw.to_string(),
            },
        );
    }
    parsed
}

fn carried_over_employee(mode: &BookingMode, existing: &[Appointment]) -> Option<String> {
    let id = mode.exclude_id()?;
    existing
        .iter()
        .find(|apt| &apt.id == id)
        .and_then(|apt| apt.employee_ref.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CanonicalType;
    use chrono::NaiveTime;

    fn create_request() -> BookingRequest {
        BookingRequest {
            date: Some("2025-06-10".to_string()),
            start_time: Some("09:00".to_string()),
            end_time: Some("10:00".to_string()),
            appointment_type: Some("Renovación".to_string()),
            modality: None,
            client_ref: Some("C1".to_string()),
            employee_ref: Some("E1".to_string()),
            note: None,
        }
    }

    #[test]
    fn test_all_missing_fields_are_collected() {
        let validator = BookingValidator::default();
        let errors = validator
            .validate(&BookingRequest::default(), &BookingMode::Create, &[])
            .unwrap_err();

        assert_eq!(errors.len(), 6);
        for field in BookingMode::Create.required_fields() {
            assert_eq!(errors.get(field), Some(&BookingError::MissingField(field.to_string())));
        }
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let validator = BookingValidator::default();
        let request = BookingRequest {
            client_ref: Some("   ".to_string()),
            ..create_request()
        };

        let errors = validator.validate(&request, &BookingMode::Create, &[]).unwrap_err();
        assert_eq!(
            errors.first(),
            Some((fields::CLIENT_REF, &BookingError::MissingField("clientRef".to_string())))
        );
    }

    #[test]
    fn test_format_errors_reported_per_field() {
        let validator = BookingValidator::default();
        let request = BookingRequest {
            date: Some("10/06/2025".to_string()),
            start_time: Some("nine".to_string()),
            ..create_request()
        };

        let errors = validator.validate(&request, &BookingMode::Create, &[]).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors.get(fields::DATE), Some(BookingError::InvalidFormat { .. })));
        assert!(matches!(errors.get(fields::START_TIME), Some(BookingError::InvalidFormat { .. })));
    }

    #[test]
    fn test_unknown_type_rejected_on_create_only() {
        let validator = BookingValidator::default();
        let request = BookingRequest {
            appointment_type: Some("tarot".to_string()),
            ..create_request()
        };

        let errors = validator.validate(&request, &BookingMode::Create, &[]).unwrap_err();
        assert_eq!(errors.get(fields::TYPE), Some(&BookingError::UnknownType));

        let reschedule = BookingMode::Reschedule { appointment_id: AppointmentId::new("1") };
        assert!(validator.validate(&request, &reschedule, &[]).is_ok());
    }

    #[test]
    fn test_out_of_window_keyed_by_offending_field() {
        let validator = BookingValidator::default();
        let late = BookingRequest {
            start_time: Some("17:30".to_string()),
            end_time: Some("18:30".to_string()),
            ..create_request()
        };

        let errors = validator.validate(&late, &BookingMode::Create, &[]).unwrap_err();
        assert_eq!(
            errors.get(fields::END_TIME),
            Some(&BookingError::OutOfWindow(NaiveTime::from_hms_opt(18, 30, 0).unwrap()))
        );

        let early = BookingRequest {
            start_time: Some("06:00".to_string()),
            ..create_request()
        };
        let errors = validator.validate(&early, &BookingMode::Create, &[]).unwrap_err();
        assert!(matches!(errors.get(fields::START_TIME), Some(BookingError::OutOfWindow(_))));
    }

    #[test]
    fn test_valid_create_produces_normalized_payload() {
        let validator = BookingValidator::default();
        let request = BookingRequest {
            modality: Some("Virtual".to_string()),
            start_time: Some("09:00:00".to_string()),
            ..create_request()
        };

        let validated = validator.validate(&request, &BookingMode::Create, &[]).unwrap();
        match validated {
            ValidatedBooking::Create(booking) => {
                assert_eq!(booking.appointment_type, CanonicalType::Renewal);
                assert_eq!(booking.modality, crate::models::Modality::Virtual);
                assert_eq!(booking.employee_ref, "E1");
                assert_eq!(booking.start_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
            }
            other => panic!("expected create payload, got {:?}", other),
        }
    }
}
