use std::sync::Arc;

use serde_json::{json, Value};

use shared_config::AppConfig;

pub const TEST_TOKEN: &str = "test-user-token";

pub struct TestConfig {
    pub citas_api_url: String,
    pub citas_api_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            citas_api_url: "http://localhost:54321".to_string(),
            citas_api_key: "test-api-key".to_string(),
        }
    }
}

impl TestConfig {
    /// Config pointing at a mock server, e.g. `MockServer::uri()`.
    pub fn with_url(url: &str) -> Self {
        Self {
            citas_api_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            citas_api_url: self.citas_api_url.clone(),
            citas_api_key: self.citas_api_key.clone(),
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Rows shaped the way the remote agency API returns them.
pub struct MockCitasResponses;

impl MockCitasResponses {
    pub fn appointment(id: i64, fecha: &str, hora_inicio: &str, hora_fin: &str, id_empleado: &str) -> Value {
        json!({
            "id_cita": id,
            "fecha": fecha,
            "hora_inicio": hora_inicio,
            "hora_fin": hora_fin,
            "tipo": "General",
            "modalidad": "Presencial",
            "estado": "Programada",
            "id_cliente": 100 + id,
            "id_empleado": id_empleado,
            "observacion": null
        })
    }

    pub fn appointment_with_state(
        id: i64,
        fecha: &str,
        hora_inicio: &str,
        hora_fin: &str,
        id_empleado: &str,
        estado: &str,
    ) -> Value {
        let mut row = Self::appointment(id, fecha, hora_inicio, hora_fin, id_empleado);
        row["estado"] = json!(estado);
        row
    }

    pub fn employee(id: &str, nombre: &str, activo: bool) -> Value {
        json!({
            "id_empleado": id,
            "nombre": nombre,
            "estado": if activo { "Activo" } else { "Inactivo" }
        })
    }

    pub fn error_response(message: &str) -> Value {
        json!({ "error": message })
    }
}
