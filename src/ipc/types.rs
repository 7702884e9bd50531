use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// A stored exam configuration waiting for its students batch. Entries live
/// for two hours and are consumed by the first successful computation.
#[derive(Debug, Clone)]
pub struct TempExamConfig {
    pub institute_id: String,
    pub config: serde_json::Value,
    pub expires_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct AppState {
    pub temp_configs: HashMap<String, TempExamConfig>,
}

impl AppState {
    pub fn purge_expired(&mut self, now: DateTime<Utc>) {
        self.temp_configs.retain(|_, cfg| cfg.expires_at > now);
    }
}
