use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::{ApiClient, ApiError};

use crate::models::{Employee, EmployeeError, EmployeeOption};

/// Source of the employees that appointments can be assigned to.
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn list_employees(&self, auth_token: &str) -> Result<Vec<Employee>, EmployeeError>;
}

pub struct EmployeeApiDirectory {
    client: Arc<ApiClient>,
}

impl EmployeeApiDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Arc::new(ApiClient::new(config)),
        }
    }
}

#[async_trait]
impl EmployeeDirectory for EmployeeApiDirectory {
    async fn list_employees(&self, auth_token: &str) -> Result<Vec<Employee>, EmployeeError> {
        debug!("Fetching employee directory");

        let rows: Vec<Value> = self.client
            .request(Method::GET, "/empleados", Some(auth_token), None)
            .await
            .map_err(|e| match e.downcast_ref::<ApiError>() {
                Some(ApiError::Unauthorized(_)) => EmployeeError::UnauthorizedAccess,
                Some(ApiError::NotFound(_)) => EmployeeError::NotFound,
                _ => EmployeeError::BackendError(e.to_string()),
            })?;

        let employees = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<Employee>(row) {
                Ok(employee) => Some(employee),
                Err(e) => {
                    warn!("Skipping unparseable employee row: {}", e);
                    None
                }
            })
            .collect();

        Ok(employees)
    }
}

pub struct EmployeeService {
    directory: Arc<dyn EmployeeDirectory>,
}

impl EmployeeService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_directory(Arc::new(EmployeeApiDirectory::new(config)))
    }

    pub fn with_directory(directory: Arc<dyn EmployeeDirectory>) -> Self {
        Self { directory }
    }

    /// Active employees for the booking form, sorted by name.
    pub async fn list_active_employees(&self, auth_token: &str) -> Result<Vec<EmployeeOption>, EmployeeError> {
        let mut options: Vec<EmployeeOption> = self.directory
            .list_employees(auth_token)
            .await?
            .iter()
            .filter(|employee| employee.active)
            .map(EmployeeOption::from)
            .collect();

        options.sort_by_key(|option| option.display_name.to_lowercase());

        debug!("{} active employees available", options.len());
        Ok(options)
    }
}
