use anyhow::{Error, Result, anyhow};
use dotenvy::dotenv;
use serde::Deserialize;

use crate::models::retry::RetryConfig;

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    pub rabbitmq_url: String,
    pub prepare_queue_name: String,
    pub data_queue_name: String,
    pub delay_queue_name: String,
    pub failed_queue_name: String,
    pub prefetch_count: u16,

    pub database_url: String,

    pub card_service_url: String,

    /// Scheduled visibility delay on dispatched triggers, letting the
    /// snapshot write settle before the downstream stage wakes up.
    #[serde(default = "default_send_delay_seconds")]
    pub send_delay_seconds: i64,

    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,

    #[serde(default = "default_retry_delay_ms")]
    pub max_retry_delay_ms: u64,

    #[serde(default = "default_retry_backoff_multiplier")]
    pub retry_backoff_multiplier: u64,

    pub server_port: u16,
}

fn default_send_delay_seconds() -> i64 {
    30
}

fn default_max_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    5_000
}

fn default_retry_backoff_multiplier() -> u64 {
    1
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        dotenv().ok();

        let config = envy::from_env::<Self>()
            .map_err(|_| anyhow!("Invalid or missing environmental variable"))?;
        Ok(config)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_retry_attempts,
            initial_delay_ms: self.initial_retry_delay_ms,
            max_delay_ms: self.max_retry_delay_ms,
            backoff_multiplier: self.retry_backoff_multiplier,
        }
    }
}
