use serde::{Deserialize, Deserializer, Serialize};

/// Agency employee who can be assigned to appointments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "EmployeeRow")]
pub struct Employee {
    pub employee_ref: String,

    pub display_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    pub active: bool,
}

/// Employee row as stored by the backend. The directory has used several
/// spellings for the same column, sometimes more than one in a single row.
#[derive(Deserialize)]
struct EmployeeRow {
    #[serde(default, deserialize_with = "optional_ref")]
    id_empleado: Option<String>,
    #[serde(rename = "idEmpleado", default, deserialize_with = "optional_ref")]
    id_empleado_camel: Option<String>,
    #[serde(default, deserialize_with = "optional_ref")]
    id: Option<String>,
    #[serde(rename = "employeeRef", default, deserialize_with = "optional_ref")]
    employee_ref_camel: Option<String>,
    #[serde(default, deserialize_with = "optional_ref")]
    employee_ref: Option<String>,

    #[serde(default)]
    nombre: Option<String>,
    #[serde(default)]
    nombres: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(rename = "displayName", default)]
    display_name_camel: Option<String>,
    #[serde(default)]
    display_name: Option<String>,

    #[serde(default)]
    apellido: Option<String>,
    #[serde(default)]
    apellidos: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(rename = "lastName", default)]
    last_name_camel: Option<String>,

    #[serde(default)]
    estado: Option<FlagOrText>,
    #[serde(default)]
    activo: Option<FlagOrText>,
    #[serde(default)]
    is_active: Option<FlagOrText>,
    #[serde(default)]
    active: Option<FlagOrText>,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = String;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        let employee_ref = row.id_empleado
            .or(row.id_empleado_camel)
            .or(row.id)
            .or(row.employee_ref_camel)
            .or(row.employee_ref)
            .ok_or_else(|| "employee row without id".to_string())?;

        let display_name = row.nombre
            .or(row.nombres)
            .or(row.first_name)
            .or(row.display_name_camel)
            .or(row.display_name)
            .unwrap_or_default();

        let last_name = row.apellido
            .or(row.apellidos)
            .or(row.last_name)
            .or(row.last_name_camel);

        let active = row.estado
            .or(row.activo)
            .or(row.is_active)
            .or(row.active)
            .map_or(true, FlagOrText::is_active);

        Ok(Self { employee_ref, display_name, last_name, active })
    }
}

impl Employee {
    pub fn full_name(&self) -> String {
        match self.last_name.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            Some(last_name) => format!("{} {}", self.display_name.trim(), last_name),
            None => self.display_name.trim().to_string(),
        }
    }
}

/// Entry of the employee picker shown when booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeOption {
    pub employee_ref: String,
    pub display_name: String,
}

impl From<&Employee> for EmployeeOption {
    fn from(employee: &Employee) -> Self {
        Self {
            employee_ref: employee.employee_ref.clone(),
            display_name: employee.full_name(),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EmployeeError {
    #[error("Employee not found")]
    NotFound,

    #[error("Unauthorized access to employee data")]
    UnauthorizedAccess,

    #[error("Backend error: {0}")]
    BackendError(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagOrText {
    Flag(bool),
    Number(i64),
    Text(String),
}

impl FlagOrText {
    fn is_active(self) -> bool {
        match self {
            FlagOrText::Flag(flag) => flag,
            FlagOrText::Number(n) => n != 0,
            FlagOrText::Text(text) => matches!(
                text.trim().to_lowercase().as_str(),
                "activo" | "activa" | "active" | "true" | "1" | "si" | "sí"
            ),
        }
    }
}

/// Ids come as strings or numbers. Blank strings count as missing.
fn optional_ref<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(i64),
    }

    Ok(match Option::<TextOrNumber>::deserialize(deserializer)? {
        Some(TextOrNumber::Text(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Some(TextOrNumber::Text(_)) | None => None,
        Some(TextOrNumber::Number(n)) => Some(n.to_string()),
    })
}
