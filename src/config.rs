use std::env;

use anyhow::{Context, Result};
use chrono::NaiveTime;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,
    pub log_dir: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    // Daily attendance reset
    pub reset_job_enabled: bool,
    pub reset_job_at: NaiveTime,
}

impl Config {
    /// Reads configuration from the environment; call `dotenvy::dotenv()` first
    /// to pick up a local `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).with_context(|| format!("{key} must be set"));
        let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let rate_raw = get_or("RATE_PROTECTED_PER_MIN", "1000");
        let enabled_raw = get_or("RESET_JOB_ENABLED", "true");
        let at_raw = get_or("RESET_JOB_AT", "00:00");

        Ok(Self {
            server_addr: get("SERVER_ADDR")?,
            database_url: get("DATABASE_URL")?,
            jwt_secret: get("JWT_SECRET")?,
            api_prefix: get_or("API_PREFIX", "/api"),
            log_dir: get_or("LOG_DIR", "logs"),

            rate_protected_per_min: rate_raw
                .parse()
                .with_context(|| format!("RATE_PROTECTED_PER_MIN is not a number: {rate_raw}"))?,

            reset_job_enabled: enabled_raw
                .parse()
                .with_context(|| format!("RESET_JOB_ENABLED must be true or false: {enabled_raw}"))?,
            reset_job_at: NaiveTime::parse_from_str(&at_raw, "%H:%M")
                .with_context(|| format!("RESET_JOB_AT must be HH:MM: {at_raw}"))?,
        })
    }
}
