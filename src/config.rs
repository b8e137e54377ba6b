use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use dotenvy::dotenv;
use serde::Deserialize;

use crate::{
    errors::WriterError,
    models::{topology::Topology, validation::validate_table_name},
};

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    pub rabbitmq_url: String,

    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_exchange_name")]
    pub exchange_name: String,

    #[serde(default = "default_system_name")]
    pub system_name: String,
    #[serde(default = "default_employee_id")]
    pub employee_id: i64,

    #[serde(default = "default_true")]
    pub audit_enabled: bool,
    #[serde(default = "default_audit_table")]
    pub audit_table: String,
    #[serde(default = "default_audit_timeout_seconds")]
    pub audit_timeout_seconds: u64,

    #[serde(default)]
    pub strict_routing: bool,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_exchange_name() -> String {
    crate::models::topology::DEFAULT_EXCHANGE.to_string()
}

fn default_system_name() -> String {
    "CRM".to_string()
}

fn default_employee_id() -> i64 {
    123
}

fn default_true() -> bool {
    true
}

fn default_audit_table() -> String {
    "audit_logs".to_string()
}

fn default_audit_timeout_seconds() -> u64 {
    10
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        dotenv().ok();

        let config = envy::from_env::<Self>()
            .map_err(|e| anyhow!("Invalid or missing environmental variable: {}", e))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WriterError> {
        if self.audit_enabled {
            if self.database_url.is_none() {
                return Err(WriterError::Config(
                    "DATABASE_URL is required when AUDIT_ENABLED is true".to_string(),
                ));
            }
            validate_table_name(&self.audit_table)?;
        }

        if self.audit_timeout_seconds == 0 {
            return Err(WriterError::Config(
                "AUDIT_TIMEOUT_SECONDS must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn topology(&self) -> Topology {
        Topology::notify(&self.exchange_name)
    }

    pub fn audit_timeout(&self) -> Duration {
        Duration::from_secs(self.audit_timeout_seconds)
    }
}
