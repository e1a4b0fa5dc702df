use std::env;
use tracing::warn;

pub const DEFAULT_BUSINESS_OPENS_AT: &str = "07:00";
pub const DEFAULT_BUSINESS_CLOSES_AT: &str = "18:00";
pub const DEFAULT_SLOT_MINUTES: u32 = 60;
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub citas_api_url: String,
    pub citas_api_key: String,
    pub business_opens_at: String,
    pub business_closes_at: String,
    pub slot_minutes: u32,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            citas_api_url: env::var("CITAS_API_URL")
                .unwrap_or_else(|_| {
                    warn!("CITAS_API_URL not set, using empty value");
                    String::new()
                }),
            citas_api_key: env::var("CITAS_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("CITAS_API_KEY not set, requests will carry no api key");
                    String::new()
                }),
            business_opens_at: text_or_default("BUSINESS_OPENS_AT", DEFAULT_BUSINESS_OPENS_AT),
            business_closes_at: text_or_default("BUSINESS_CLOSES_AT", DEFAULT_BUSINESS_CLOSES_AT),
            slot_minutes: parse_or_default("SLOT_MINUTES", DEFAULT_SLOT_MINUTES),
            port: parse_or_default("PORT", DEFAULT_PORT),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.citas_api_url.is_empty()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            citas_api_url: String::new(),
            citas_api_key: String::new(),
            business_opens_at: DEFAULT_BUSINESS_OPENS_AT.to_string(),
            business_closes_at: DEFAULT_BUSINESS_CLOSES_AT.to_string(),
            slot_minutes: DEFAULT_SLOT_MINUTES,
            port: DEFAULT_PORT,
        }
    }
}

fn text_or_default(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().to_string(),
        _ => {
            warn!("{} not set, using default {}", key, default);
            default.to_string()
        }
    }
}

fn parse_or_default<T: std::str::FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
