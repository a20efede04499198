use std::env;

use crate::scheduling::rules::{DEFAULT_CALENDAR_DAYS, SLOT_RANGE_DAYS};

const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub storage_path: String,
    pub db_path: String,
    pub api_base_url: String,
    pub poll_interval_secs: u64,
    pub calendar_days: i64,
}

impl AppConfig {
    /// Directory holding the client session blob
    pub fn session_path(&self) -> &str {
        &self.storage_path
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let host = "127.0.0.1";
        let port = "2222";
        let storage_path = env::var("LYNX_STORAGE_PATH").unwrap_or("./".to_string());
        let db_path = format!("{}/lynxhealth.db", storage_path.trim_end_matches('/'));
        let api_base_url =
            env::var("LYNX_API_URL").unwrap_or(format!("http://{}:{}", host, port));
        let poll_interval_secs = env::var("LYNX_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        let calendar_days = env::var("LYNX_CALENDAR_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|days| (1..=SLOT_RANGE_DAYS).contains(days))
            .unwrap_or(DEFAULT_CALENDAR_DAYS);

        Self {
            storage_path,
            db_path,
            api_base_url,
            poll_interval_secs,
            calendar_days,
        }
    }
}
