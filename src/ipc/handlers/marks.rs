use chrono::Utc;
use serde_json::json;

use crate::calc::grace::{compute_exam_marks, ExamMarksPayload};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

/// Admission control for one computation batch; larger cohorts must be
/// split by the caller.
const MARKS_COMPUTE_MAX_STUDENTS: usize = 1000;

fn handle_compute(state: &mut AppState, req: &Request) -> serde_json::Value {
    let temp_id = match req.params.get("tempId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing tempId", None),
    };
    let students = match req.params.get("students").and_then(|v| v.as_array()) {
        Some(v) => v.clone(),
        None => return err(&req.id, "bad_params", "missing students array", None),
    };
    if students.is_empty() {
        return err(&req.id, "bad_params", "students must not be empty", None);
    }
    if students.len() > MARKS_COMPUTE_MAX_STUDENTS {
        return err(
            &req.id,
            "bad_params",
            "students exceeds the batch cap",
            Some(json!({ "max": MARKS_COMPUTE_MAX_STUDENTS, "got": students.len() })),
        );
    }

    state.purge_expired(Utc::now());
    let mut merged = match state.temp_configs.get(&temp_id) {
        Some(temp) => temp.config.clone(),
        None => return err(&req.id, "config_expired", "config expired or invalid", None),
    };
    merged["students"] = serde_json::Value::Array(students);

    let payload: ExamMarksPayload = match serde_json::from_value(merged) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let outcome = compute_exam_marks(&payload);

    // Single use: the stored config is consumed by a successful computation.
    state.temp_configs.remove(&temp_id);

    match serde_json::to_value(&outcome) {
        Ok(v) => ok(&req.id, v),
        Err(e) => err(&req.id, "internal", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "marks.compute" => Some(handle_compute(state, req)),
        _ => None,
    }
}
