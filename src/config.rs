use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub carrier_api_url: String,
    pub carrier_api_key: String,
    pub origin_branch: String,
    pub carrier_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            carrier_api_url: env::var("NCM_API_URL")
                .unwrap_or_else(|_| "https://portal.nepalcanmove.com/api/v1".to_string()),
            carrier_api_key: env::var("NCM_API_KEY").unwrap_or_default(),
            origin_branch: env::var("NCM_ORIGIN_BRANCH").unwrap_or_else(|_| "BIRGUNJ".to_string()),
            carrier_timeout_secs: parse_or_default("CARRIER_TIMEOUT_SECS", 30)?,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
