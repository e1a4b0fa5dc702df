// libs/appointment-cell/src/models.rs
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::services::normalizer;
use crate::services::time_window::parse_time_of_day;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// Opaque appointment identifier assigned by the remote backend.
///
/// The backend delivers it either as a number or as a string; both are kept
/// as text so comparisons stay exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AppointmentId(pub String);

impl AppointmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AppointmentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        wire::string_or_number(deserializer).map(AppointmentId)
    }
}

/// Canonical appointment shape. Backend rows are read through
/// `AppointmentRow`, which folds every field-name variant into this struct,
/// so nothing past the deserialization step ever needs fallback chains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "AppointmentRow")]
pub struct Appointment {
    pub id: AppointmentId,

    pub date: NaiveDate,

    #[serde(serialize_with = "wire::serialize_time")]
    pub start_time: NaiveTime,

    #[serde(serialize_with = "wire::serialize_time")]
    pub end_time: NaiveTime,

    #[serde(rename = "type")]
    pub appointment_type: CanonicalType,

    pub modality: Modality,

    pub state: AppointmentState,

    pub client_ref: Option<String>,

    pub employee_ref: Option<String>,

    pub note: Option<String>,
}

/// One appointment row as any backend version may send it. Rows often carry
/// several spellings of the same field at once (`id` next to `id_cita`), so
/// each spelling gets its own slot and the first present one wins.
#[derive(Debug, Default, Deserialize)]
struct AppointmentRow {
    #[serde(default, deserialize_with = "wire::optional_ref")]
    id_cita: Option<String>,
    #[serde(rename = "idCita", default, deserialize_with = "wire::optional_ref")]
    id_cita_camel: Option<String>,
    #[serde(default, deserialize_with = "wire::optional_ref")]
    id: Option<String>,

    fecha: Option<String>,
    date: Option<String>,

    hora_inicio: Option<String>,
    #[serde(rename = "horaInicio")]
    hora_inicio_camel: Option<String>,
    #[serde(rename = "startTime")]
    start_time_camel: Option<String>,
    start_time: Option<String>,

    hora_fin: Option<String>,
    #[serde(rename = "horaFin")]
    hora_fin_camel: Option<String>,
    #[serde(rename = "endTime")]
    end_time_camel: Option<String>,
    end_time: Option<String>,

    tipo: Option<CanonicalType>,
    tipo_cita: Option<CanonicalType>,
    #[serde(rename = "type")]
    type_name: Option<CanonicalType>,
    appointment_type: Option<CanonicalType>,

    modalidad: Option<Modality>,
    modality: Option<Modality>,

    estado: Option<AppointmentState>,
    status: Option<AppointmentState>,
    state: Option<AppointmentState>,

    #[serde(default, deserialize_with = "wire::optional_ref")]
    id_cliente: Option<String>,
    #[serde(rename = "idCliente", default, deserialize_with = "wire::optional_ref")]
    id_cliente_camel: Option<String>,
    #[serde(rename = "clientRef", default, deserialize_with = "wire::optional_ref")]
    client_ref_camel: Option<String>,
    #[serde(default, deserialize_with = "wire::optional_ref")]
    client_ref: Option<String>,

    #[serde(default, deserialize_with = "wire::optional_ref")]
    id_empleado: Option<String>,
    #[serde(rename = "idEmpleado", default, deserialize_with = "wire::optional_ref")]
    id_empleado_camel: Option<String>,
    #[serde(rename = "employeeRef", default, deserialize_with = "wire::optional_ref")]
    employee_ref_camel: Option<String>,
    #[serde(default, deserialize_with = "wire::optional_ref")]
    employee_ref: Option<String>,

    observacion: Option<String>,
    observaciones: Option<String>,
    note: Option<String>,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = String;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let id = row.id_cita
            .or(row.id_cita_camel)
            .or(row.id)
            .ok_or_else(|| "appointment row has no id".to_string())?;

        let raw_date = row.fecha.or(row.date).unwrap_or_default();
        let date = wire::parse_date(&raw_date)
            .ok_or_else(|| format!("appointment {} has invalid date '{}'", id, raw_date))?;

        let raw_start = row.hora_inicio
            .or(row.hora_inicio_camel)
            .or(row.start_time_camel)
            .or(row.start_time)
            .unwrap_or_default();
        let start_time = parse_time_of_day(&raw_start)
            .ok_or_else(|| format!("appointment {} has invalid start time '{}'", id, raw_start))?;

        let raw_end = row.hora_fin
            .or(row.hora_fin_camel)
            .or(row.end_time_camel)
            .or(row.end_time)
            .unwrap_or_default();
        let end_time = parse_time_of_day(&raw_end)
            .ok_or_else(|| format!("appointment {} has invalid end time '{}'", id, raw_end))?;

        Ok(Appointment {
            id: AppointmentId(id),
            date,
            start_time,
            end_time,
            appointment_type: row.tipo
                .or(row.tipo_cita)
                .or(row.type_name)
                .or(row.appointment_type)
                .unwrap_or_default(),
            modality: row.modalidad.or(row.modality).unwrap_or_default(),
            state: row.estado.or(row.status).or(row.state).unwrap_or_default(),
            client_ref: row.id_cliente
                .or(row.id_cliente_camel)
                .or(row.client_ref_camel)
                .or(row.client_ref),
            employee_ref: row.id_empleado
                .or(row.id_empleado_camel)
                .or(row.employee_ref_camel)
                .or(row.employee_ref),
            note: row.observacion.or(row.observaciones).or(row.note),
        })
    }
}

impl Appointment {
    /// The reserved interval of this appointment as an overlap candidate.
    pub fn slot(&self) -> SlotCandidate {
        SlotCandidate {
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            employee_ref: self.employee_ref.clone(),
        }
    }

    pub fn blocks_slot(&self) -> bool {
        self.state.blocks_slot()
    }
}

/// Fixed appointment-type enumeration. Raw text is never stored; it always
/// goes through `normalizer::normalize_type` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum CanonicalType {
    General,
    Opposition,
    Certification,
    TrademarkAssignment,
    Renewal,
    BackgroundSearch,
    #[default]
    Unspecified,
}

impl CanonicalType {
    pub const ALL: [CanonicalType; 7] = [
        CanonicalType::General,
        CanonicalType::Opposition,
        CanonicalType::Certification,
        CanonicalType::TrademarkAssignment,
        CanonicalType::Renewal,
        CanonicalType::BackgroundSearch,
        CanonicalType::Unspecified,
    ];

    /// Display label used by the dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            CanonicalType::General => "General",
            CanonicalType::Opposition => "Oposición",
            CanonicalType::Certification => "Certificación",
            CanonicalType::TrademarkAssignment => "Cesión de marca",
            CanonicalType::Renewal => "Renovación",
            CanonicalType::BackgroundSearch => "Búsqueda de antecedentes",
            CanonicalType::Unspecified => "Sin especificar",
        }
    }

    pub fn is_specified(&self) -> bool {
        *self != CanonicalType::Unspecified
    }
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl<'de> Deserialize<'de> for CanonicalType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(normalizer::normalize_type(raw.as_deref().unwrap_or_default()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Modality {
    #[default]
    InPerson,
    Virtual,
}

impl Modality {
    pub fn label(&self) -> &'static str {
        match self {
            Modality::InPerson => "Presencial",
            Modality::Virtual => "Virtual",
        }
    }
}

impl<'de> Deserialize<'de> for Modality {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(normalizer::normalize_modality(raw.as_deref().unwrap_or_default()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentState {
    #[default]
    Scheduled,
    Rescheduled,
    Cancelled,
    Completed,
}

impl AppointmentState {
    pub const ALL: [AppointmentState; 4] = [
        AppointmentState::Scheduled,
        AppointmentState::Rescheduled,
        AppointmentState::Cancelled,
        AppointmentState::Completed,
    ];

    /// Only live appointments reserve their slot.
    pub fn blocks_slot(&self) -> bool {
        matches!(self, AppointmentState::Scheduled | AppointmentState::Rescheduled)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentState::Cancelled | AppointmentState::Completed)
    }

    /// Calendar label and color for this state.
    pub fn display(&self) -> StateDisplay {
        let (label, color) = match self {
            AppointmentState::Scheduled => ("Programada", "#3B82F6"),
            AppointmentState::Rescheduled => ("Reprogramada", "#F59E0B"),
            AppointmentState::Cancelled => ("Anulada", "#EF4444"),
            AppointmentState::Completed => ("Finalizada", "#10B981"),
        };
        StateDisplay { state: *self, label, color }
    }
}

impl fmt::Display for AppointmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentState::Scheduled => write!(f, "scheduled"),
            AppointmentState::Rescheduled => write!(f, "rescheduled"),
            AppointmentState::Cancelled => write!(f, "cancelled"),
            AppointmentState::Completed => write!(f, "completed"),
        }
    }
}

impl<'de> Deserialize<'de> for AppointmentState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(normalizer::normalize_state(raw.as_deref().unwrap_or_default()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateDisplay {
    pub state: AppointmentState,
    pub label: &'static str,
    pub color: &'static str,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Raw booking form as submitted by the dashboard. Every field is optional
/// text so that presence and format problems surface as field errors
/// instead of deserialization failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[serde(alias = "fecha")]
    pub date: Option<String>,
    #[serde(alias = "hora_inicio")]
    pub start_time: Option<String>,
    #[serde(alias = "hora_fin")]
    pub end_time: Option<String>,
    #[serde(rename = "type", alias = "tipo")]
    pub appointment_type: Option<String>,
    #[serde(alias = "modalidad")]
    pub modality: Option<String>,
    #[serde(alias = "id_cliente", default, deserialize_with = "wire::optional_ref")]
    pub client_ref: Option<String>,
    #[serde(alias = "id_empleado", default, deserialize_with = "wire::optional_ref")]
    pub employee_ref: Option<String>,
    #[serde(alias = "observacion")]
    pub note: Option<String>,
}

impl BookingRequest {
    /// Seed a booking from a client's service request. Date, times and the
    /// assigned employee still have to be chosen by the agency.
    pub fn from_client_request(client_request: &ClientRequest) -> Self {
        Self {
            appointment_type: client_request.service_type.clone(),
            modality: client_request.modality.clone(),
            client_ref: client_request.client_ref.clone(),
            note: client_request.description.clone(),
            ..Self::default()
        }
    }
}

/// A service request ("solicitud") submitted by a client, from which the
/// agency books an appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRequest {
    #[serde(alias = "id_solicitud", default, deserialize_with = "wire::optional_ref")]
    pub request_ref: Option<String>,
    #[serde(alias = "id_cliente", default, deserialize_with = "wire::optional_ref")]
    pub client_ref: Option<String>,
    #[serde(alias = "tipo_solicitud", alias = "tipo", alias = "servicio")]
    pub service_type: Option<String>,
    #[serde(alias = "modalidad")]
    pub modality: Option<String>,
    #[serde(alias = "descripcion")]
    pub description: Option<String>,
}

/// Agency-side slot choice that completes a booking seeded from a client request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookFromClientRequest {
    pub client_request: ClientRequest,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "wire::optional_ref")]
    pub employee_ref: Option<String>,
}

impl BookFromClientRequest {
    pub fn into_booking_request(self) -> BookingRequest {
        BookingRequest {
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            employee_ref: self.employee_ref,
            ..BookingRequest::from_client_request(&self.client_request)
        }
    }
}

/// Cancellation request. The `note` field must be present, though it may be empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelRequest {
    #[serde(alias = "observacion")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCheckResponse {
    pub has_conflict: bool,
    pub conflicting_ids: Vec<AppointmentId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlot {
    #[serde(serialize_with = "wire::serialize_time")]
    pub start_time: NaiveTime,
    #[serde(serialize_with = "wire::serialize_time")]
    pub end_time: NaiveTime,
}

// ==============================================================================
// VALIDATED OUTPUT MODELS
// ==============================================================================

/// An interval to test against the snapshot. `employee_ref == None` means
/// no employee assigned yet, which is checked against every employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotCandidate {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub employee_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub date: NaiveDate,
    #[serde(serialize_with = "wire::serialize_time")]
    pub start_time: NaiveTime,
    #[serde(serialize_with = "wire::serialize_time")]
    pub end_time: NaiveTime,
    #[serde(rename = "type")]
    pub appointment_type: CanonicalType,
    pub modality: Modality,
    pub client_ref: String,
    pub employee_ref: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleChange {
    pub appointment_id: AppointmentId,
    pub date: NaiveDate,
    #[serde(serialize_with = "wire::serialize_time")]
    pub start_time: NaiveTime,
    #[serde(serialize_with = "wire::serialize_time")]
    pub end_time: NaiveTime,
    pub note: Option<String>,
    pub employee_ref: Option<String>,
    pub state: AppointmentState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ValidatedBooking {
    Create(NewAppointment),
    Reschedule(RescheduleChange),
}

// ==============================================================================
// VALIDATION ERRORS
// ==============================================================================

pub mod fields {
    pub const DATE: &str = "date";
    pub const START_TIME: &str = "startTime";
    pub const END_TIME: &str = "endTime";
    pub const TYPE: &str = "type";
    pub const MODALITY: &str = "modality";
    pub const CLIENT_REF: &str = "clientRef";
    pub const EMPLOYEE_REF: &str = "employeeRef";
    pub const NOTE: &str = "note";
    pub const SLOT: &str = "slot";
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: '{value}'")]
    InvalidFormat { field: String, value: String },

    #[error("Time {} is outside business hours", .0.format("%H:%M"))]
    OutOfWindow(NaiveTime),

    #[error("End time must be after start time")]
    EndNotAfterStart,

    #[error("The selected slot overlaps an existing appointment")]
    SchedulingConflict(Option<AppointmentId>),

    #[error("Unknown appointment type")]
    UnknownType,
}

/// Field-keyed validation failures, in the order they were detected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrorMap {
    errors: Vec<(String, BookingError)>,
}

impl FieldErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, error: BookingError) -> Self {
        let mut map = Self::new();
        map.insert(field, error);
        map
    }

    /// A conflict reported for the whole slot, local or from the backend.
    pub fn conflict(conflicting_id: Option<AppointmentId>) -> Self {
        Self::single(fields::SLOT, BookingError::SchedulingConflict(conflicting_id))
    }

    /// Records an error for `field`; the first error per field wins.
    pub fn insert(&mut self, field: &str, error: BookingError) {
        if self.get(field).is_none() {
            self.errors.push((field.to_string(), error));
        }
    }

    pub fn get(&self, field: &str) -> Option<&BookingError> {
        self.errors.iter().find(|(name, _)| name == field).map(|(_, e)| e)
    }

    pub fn first(&self) -> Option<(&str, &BookingError)> {
        self.errors.first().map(|(name, e)| (name.as_str(), e))
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BookingError)> {
        self.errors.iter().map(|(name, e)| (name.as_str(), e))
    }

    pub fn is_conflict(&self) -> bool {
        self.errors
            .iter()
            .any(|(_, e)| matches!(e, BookingError::SchedulingConflict(_)))
    }

    /// Human-readable message per field, for the HTTP layer.
    pub fn messages(&self) -> std::collections::BTreeMap<String, String> {
        self.errors
            .iter()
            .map(|(name, e)| (name.clone(), e.to_string()))
            .collect()
    }
}

impl fmt::Display for FieldErrorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first() {
            Some((_, error)) if self.len() > 1 => {
                write!(f, "{} (and {} more)", error, self.len() - 1)
            }
            Some((_, error)) => write!(f, "{}", error),
            None => write!(f, "no validation errors"),
        }
    }
}

impl std::error::Error for FieldErrorMap {}

// ==============================================================================
// SERVICE ERRORS
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Appointment cannot be modified in current state: {0}")]
    InvalidStateTransition(AppointmentState),

    #[error("{0}")]
    Validation(FieldErrorMap),

    #[error("Unauthorized access to appointment")]
    Unauthorized,

    #[error("Backend error: {0}")]
    BackendError(String),
}

impl From<FieldErrorMap> for AppointmentError {
    fn from(errors: FieldErrorMap) -> Self {
        AppointmentError::Validation(errors)
    }
}

// ==============================================================================
// WIRE FORMAT HELPERS
// ==============================================================================

pub(crate) mod wire {
    use chrono::{NaiveDate, NaiveTime};
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    impl TextOrNumber {
        fn into_string(self) -> String {
            match self {
                TextOrNumber::Text(s) => s,
                TextOrNumber::Integer(n) => n.to_string(),
                TextOrNumber::Float(n) => n.to_string(),
            }
        }
    }

    pub fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        TextOrNumber::deserialize(deserializer).map(TextOrNumber::into_string)
    }

    pub fn optional_ref<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let value = Option::<TextOrNumber>::deserialize(deserializer)?;
        Ok(value
            .map(TextOrNumber::into_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()))
    }

    /// Accepts `YYYY-MM-DD`, tolerating a trailing time component.
    pub fn parse_date(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        let day = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }

    pub fn serialize_time<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_appointment_from_backend_field_names() {
        let raw = json!({
            "id_cita": 42,
            "fecha": "2025-06-10",
            "hora_inicio": "09:00:00",
            "hora_fin": "10:00:00",
            "tipo": "oposicion",
            "modalidad": "Virtual",
            "estado": "Reprogramada",
            "id_cliente": 7,
            "id_empleado": "E1",
            "observacion": null
        });

        let appointment: Appointment = serde_json::from_value(raw).unwrap();

        assert_eq!(appointment.id, AppointmentId::new("42"));
        assert_eq!(appointment.start_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(appointment.appointment_type, CanonicalType::Opposition);
        assert_eq!(appointment.modality, Modality::Virtual);
        assert_eq!(appointment.state, AppointmentState::Rescheduled);
        assert_eq!(appointment.client_ref.as_deref(), Some("7"));
        assert_eq!(appointment.employee_ref.as_deref(), Some("E1"));
    }

    #[test]
    fn test_appointment_from_camel_case_fields() {
        let raw = json!({
            "id": "abc",
            "date": "2025-06-10",
            "horaInicio": "14:00",
            "horaFin": "15:30",
            "type": "Cesión de marca",
            "employeeRef": "E2"
        });

        let appointment: Appointment = serde_json::from_value(raw).unwrap();

        assert_eq!(appointment.end_time, NaiveTime::from_hms_opt(15, 30, 0).unwrap());
        assert_eq!(appointment.appointment_type, CanonicalType::TrademarkAssignment);
        assert_eq!(appointment.state, AppointmentState::Scheduled);
        assert_eq!(appointment.modality, Modality::InPerson);
        assert!(appointment.client_ref.is_none());
    }

    #[test]
    fn test_row_with_several_spellings_of_one_field() {
        let raw = json!({
            "id": 4,
            "id_cita": 4,
            "fecha": "2025-06-10",
            "date": "2025-06-10",
            "hora_inicio": "09:30:00",
            "horaInicio": "09:30",
            "hora_fin": "10:30:00",
            "estado": "Programada",
            "status": "scheduled",
            "id_empleado": "E1",
            "employeeRef": "E1"
        });

        let appointment: Appointment = serde_json::from_value(raw).unwrap();

        assert_eq!(appointment.id, AppointmentId::new("4"));
        assert_eq!(appointment.start_time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(appointment.state, AppointmentState::Scheduled);
        assert_eq!(appointment.employee_ref.as_deref(), Some("E1"));
    }

    #[test]
    fn test_backend_spelling_wins_over_generic_one() {
        let raw = json!({
            "id": "generic",
            "id_cita": "77",
            "fecha": "2025-06-10",
            "hora_inicio": "08:00",
            "hora_fin": "09:00",
            "estado": "Anulada",
            "state": "scheduled"
        });

        let appointment: Appointment = serde_json::from_value(raw).unwrap();

        assert_eq!(appointment.id, AppointmentId::new("77"));
        assert_eq!(appointment.state, AppointmentState::Cancelled);
    }

    #[test]
    fn test_row_without_id_or_times_is_rejected() {
        assert!(serde_json::from_value::<Appointment>(json!({
            "fecha": "2025-06-10", "hora_inicio": "08:00", "hora_fin": "09:00"
        }))
        .is_err());
        assert!(serde_json::from_value::<Appointment>(json!({
            "id": 1, "fecha": "2025-06-10", "hora_inicio": "08:00"
        }))
        .is_err());
    }

    #[test]
    fn test_serialized_appointment_reads_back_identically() {
        let raw = json!({
            "id": 5,
            "fecha": "2025-06-10T00:00:00",
            "hora_inicio": "08:00",
            "hora_fin": "09:00",
            "tipo": "renovaciones",
            "estado": "Anulada",
            "id_empleado": 3
        });
        let appointment: Appointment = serde_json::from_value(raw).unwrap();

        let serialized = serde_json::to_value(&appointment).unwrap();
        assert_eq!(serialized["startTime"], "08:00");
        assert_eq!(serialized["type"], "Renewal");
        assert_eq!(serialized["state"], "cancelled");

        let reread: Appointment = serde_json::from_value(serialized).unwrap();
        assert_eq!(reread, appointment);
    }

    #[test]
    fn test_field_error_map_keeps_first_error_per_field() {
        let mut errors = FieldErrorMap::new();
        errors.insert(fields::DATE, BookingError::MissingField(fields::DATE.to_string()));
        errors.insert(fields::DATE, BookingError::UnknownType);
        errors.insert(fields::END_TIME, BookingError::EndNotAfterStart);

        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.get(fields::DATE),
            Some(&BookingError::MissingField("date".to_string()))
        );
        assert_eq!(errors.to_string(), "Missing required field: date (and 1 more)");
        assert!(!errors.is_conflict());
        assert!(FieldErrorMap::conflict(None).is_conflict());
    }

    #[test]
    fn test_state_display_is_deterministic() {
        for state in AppointmentState::ALL {
            assert_eq!(state.display(), state.display());
            assert_eq!(state.display().state, state);
        }
        assert_eq!(AppointmentState::Cancelled.display().label, "Anulada");
    }

    #[test]
    fn test_booking_from_client_request() {
        let client_request = ClientRequest {
            request_ref: Some("S-9".to_string()),
            client_ref: Some("C1".to_string()),
            service_type: Some("Búsqueda de antecedentes".to_string()),
            modality: Some("virtual".to_string()),
            description: Some("Revisar clase 25".to_string()),
        };

        let booking = BookingRequest::from_client_request(&client_request);

        assert_eq!(booking.client_ref.as_deref(), Some("C1"));
        assert_eq!(booking.appointment_type.as_deref(), Some("Búsqueda de antecedentes"));
        assert!(booking.date.is_none());
        assert!(booking.employee_ref.is_none());
    }
}
