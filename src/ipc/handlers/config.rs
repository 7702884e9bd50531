use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request, TempExamConfig};

/// Stored configurations expire two hours after storage.
const TEMP_CONFIG_TTL_HOURS: i64 = 2;

fn handle_store(state: &mut AppState, req: &Request) -> serde_json::Value {
    if !req.params.is_object() {
        return err(&req.id, "bad_params", "params must be an object", None);
    }
    let institute_id = match req.params.get("instituteId").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => return err(&req.id, "bad_params", "missing instituteId", None),
    };

    let now = Utc::now();
    state.purge_expired(now);

    let temp_id = format!("temp_{}", Uuid::new_v4().simple());
    let expires_at = now + Duration::hours(TEMP_CONFIG_TTL_HOURS);
    state.temp_configs.insert(
        temp_id.clone(),
        TempExamConfig {
            institute_id,
            config: req.params.clone(),
            expires_at,
        },
    );

    ok(
        &req.id,
        json!({
            "status": "config_saved",
            "tempId": temp_id,
            "expiresAt": expires_at.to_rfc3339(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "examConfig.store" => Some(handle_store(state, req)),
        _ => None,
    }
}
