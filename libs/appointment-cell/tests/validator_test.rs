// libs/appointment-cell/tests/validator_test.rs
use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};

use appointment_cell::models::*;
use appointment_cell::services::normalizer::normalize_type;
use appointment_cell::{BookingMode, BookingValidator};

fn t(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
}

fn existing(id: &str, employee: &str, start: NaiveTime, end: NaiveTime, state: AppointmentState) -> Appointment {
    Appointment {
        id: AppointmentId::new(id),
        date: day(),
        start_time: start,
        end_time: end,
        appointment_type: CanonicalType::General,
        modality: Modality::InPerson,
        state,
        client_ref: Some("C9".to_string()),
        employee_ref: Some(employee.to_string()),
        note: None,
    }
}

fn request(start: &str, end: &str) -> BookingRequest {
    BookingRequest {
        date: Some("2025-06-10".to_string()),
        start_time: Some(start.to_string()),
        end_time: Some(end.to_string()),
        appointment_type: Some("General".to_string()),
        modality: Some("Presencial".to_string()),
        client_ref: Some("C1".to_string()),
        employee_ref: Some("E1".to_string()),
        note: None,
    }
}

fn reschedule_of(id: &str) -> BookingMode {
    BookingMode::Reschedule { appointment_id: AppointmentId::new(id) }
}

#[test]
fn free_slot_is_accepted() {
    let validator = BookingValidator::default();
    let snapshot = vec![existing("1", "E1", t(11, 0), t(12, 0), AppointmentState::Scheduled)];

    let validated = validator
        .validate(&request("09:00", "10:00"), &BookingMode::Create, &snapshot)
        .unwrap();

    assert_matches!(validated, ValidatedBooking::Create(booking) => {
        assert_eq!(booking.date, day());
        assert_eq!(booking.start_time, t(9, 0));
        assert_eq!(booking.end_time, t(10, 0));
        assert_eq!(booking.appointment_type, CanonicalType::General);
        assert_eq!(booking.client_ref, "C1");
    });
}

#[test]
fn overlapping_slot_reports_conflicting_appointment() {
    let validator = BookingValidator::default();
    let snapshot = vec![existing("7", "E1", t(9, 30), t(10, 30), AppointmentState::Scheduled)];

    let errors = validator
        .validate(&request("09:00", "10:00"), &BookingMode::Create, &snapshot)
        .unwrap_err();

    assert!(errors.is_conflict());
    assert_eq!(
        errors.get(fields::SLOT),
        Some(&BookingError::SchedulingConflict(Some(AppointmentId::new("7"))))
    );
}

#[test]
fn touching_appointments_do_not_conflict() {
    let validator = BookingValidator::default();
    let snapshot = vec![
        existing("1", "E1", t(8, 0), t(9, 0), AppointmentState::Scheduled),
        existing("2", "E1", t(10, 0), t(11, 0), AppointmentState::Scheduled),
    ];

    assert!(validator
        .validate(&request("09:00", "10:00"), &BookingMode::Create, &snapshot)
        .is_ok());
}

#[test]
fn other_employees_schedule_does_not_block() {
    let validator = BookingValidator::default();
    let snapshot = vec![existing("1", "E2", t(9, 0), t(10, 0), AppointmentState::Scheduled)];

    assert!(validator
        .validate(&request("09:00", "10:00"), &BookingMode::Create, &snapshot)
        .is_ok());
}

#[test]
fn reschedule_excludes_itself_but_not_others() {
    let validator = BookingValidator::default();
    let snapshot = vec![
        existing("X", "E1", t(9, 0), t(10, 0), AppointmentState::Scheduled),
        existing("Y", "E1", t(10, 30), t(11, 30), AppointmentState::Scheduled),
    ];

    // Moving half an hour later only overlaps its own old slot
    let moved = validator
        .validate(&request("09:30", "10:30"), &reschedule_of("X"), &snapshot)
        .unwrap();
    assert_matches!(moved, ValidatedBooking::Reschedule(change) => {
        assert_eq!(change.appointment_id, AppointmentId::new("X"));
        assert_eq!(change.start_time, t(9, 30));
        assert_eq!(change.state, AppointmentState::Rescheduled);
    });

    let errors = validator
        .validate(&request("10:00", "11:00"), &reschedule_of("X"), &snapshot)
        .unwrap_err();
    assert_eq!(
        errors.get(fields::SLOT),
        Some(&BookingError::SchedulingConflict(Some(AppointmentId::new("Y"))))
    );
}

#[test]
fn reschedule_in_place_never_conflicts_with_itself() {
    let validator = BookingValidator::default();
    let snapshot = vec![existing("X", "E1", t(14, 0), t(15, 0), AppointmentState::Rescheduled)];

    assert!(validator
        .validate(&request("14:00", "15:00"), &reschedule_of("X"), &snapshot)
        .is_ok());
}

#[test]
fn reschedule_without_employee_keeps_the_current_one() {
    let validator = BookingValidator::default();
    let snapshot = vec![
        existing("X", "E1", t(9, 0), t(10, 0), AppointmentState::Scheduled),
        existing("Z", "E2", t(15, 0), t(16, 0), AppointmentState::Scheduled),
    ];
    let request = BookingRequest {
        date: Some("2025-06-10".to_string()),
        start_time: Some("15:00".to_string()),
        end_time: Some("16:00".to_string()),
        ..BookingRequest::default()
    };

    // E2 is busy at 15:00 but the appointment stays with E1
    let change = validator.validate(&request, &reschedule_of("X"), &snapshot).unwrap();
    assert_matches!(change, ValidatedBooking::Reschedule(change) => {
        assert_eq!(change.employee_ref.as_deref(), Some("E1"));
    });
}

#[test]
fn accent_and_case_variants_normalize_to_the_same_type() {
    assert_eq!(normalize_type("oposición"), CanonicalType::Opposition);
    assert_eq!(normalize_type("OPOSICION"), CanonicalType::Opposition);

    let validator = BookingValidator::default();
    let request = BookingRequest {
        appointment_type: Some("OPOSICION".to_string()),
        ..request("09:00", "10:00")
    };
    assert_matches!(
        validator.validate(&request, &BookingMode::Create, &[]),
        Ok(ValidatedBooking::Create(booking)) if booking.appointment_type == CanonicalType::Opposition
    );
}

#[test]
fn missing_employee_skips_window_and_overlap_checks() {
    let validator = BookingValidator::default();
    let snapshot = vec![existing("1", "E1", t(5, 0), t(6, 0), AppointmentState::Scheduled)];
    let request = BookingRequest {
        employee_ref: None,
        ..request("05:00", "06:00")
    };

    let errors = validator
        .validate(&request, &BookingMode::Create, &snapshot)
        .unwrap_err();

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.first(),
        Some((fields::EMPLOYEE_REF, &BookingError::MissingField("employeeRef".to_string())))
    );
}

#[test]
fn window_boundaries_are_enforced() {
    let validator = BookingValidator::default();

    assert!(validator.validate(&request("07:00", "08:00"), &BookingMode::Create, &[]).is_ok());
    assert!(validator.validate(&request("17:00", "18:00"), &BookingMode::Create, &[]).is_ok());

    let early = validator
        .validate(&request("06:59", "08:00"), &BookingMode::Create, &[])
        .unwrap_err();
    assert_eq!(early.get(fields::START_TIME), Some(&BookingError::OutOfWindow(t(6, 59))));

    let empty = validator
        .validate(&request("09:00", "09:00"), &BookingMode::Create, &[])
        .unwrap_err();
    assert_eq!(empty.get(fields::END_TIME), Some(&BookingError::EndNotAfterStart));
}

#[test]
fn cancelled_and_completed_slots_are_bookable() {
    let validator = BookingValidator::default();
    let snapshot = vec![
        existing("1", "E1", t(9, 0), t(10, 0), AppointmentState::Cancelled),
        existing("2", "E1", t(9, 0), t(10, 0), AppointmentState::Completed),
    ];

    assert!(validator
        .validate(&request("09:00", "10:00"), &BookingMode::Create, &snapshot)
        .is_ok());
}

#[test]
fn reschedule_requires_only_date_and_times() {
    let validator = BookingValidator::default();

    let errors = validator
        .validate(&BookingRequest::default(), &reschedule_of("X"), &[])
        .unwrap_err();

    assert_eq!(errors.len(), 3);
    assert!(errors.get(fields::CLIENT_REF).is_none());
    assert_matches!(errors.get(fields::DATE), Some(BookingError::MissingField(_)));
}

#[test]
fn unassigned_reschedule_checks_every_employee() {
    let validator = BookingValidator::default();
    // The appointment being moved is not in the snapshot and carries no employee
    let snapshot = vec![existing("busy", "E3", t(12, 0), t(13, 0), AppointmentState::Scheduled)];
    let request = BookingRequest {
        date: Some("2025-06-10".to_string()),
        start_time: Some("12:30".to_string()),
        end_time: Some("13:30".to_string()),
        ..BookingRequest::default()
    };

    let errors = validator.validate(&request, &reschedule_of("X"), &snapshot).unwrap_err();
    assert!(errors.is_conflict());
}
