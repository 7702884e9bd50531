use crate::calc::merit::{compute_merit, MeritPayload};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

fn handle_compute(req: &Request) -> serde_json::Value {
    let payload: MeritPayload = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let outcome = compute_merit(&payload);
    match serde_json::to_value(&outcome) {
        Ok(v) => ok(&req.id, v),
        Err(e) => err(&req.id, "internal", e.to_string(), None),
    }
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "merit.compute" => Some(handle_compute(req)),
        _ => None,
    }
}
