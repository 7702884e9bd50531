mod calc;
mod ipc;

use std::io::{self, BufRead, Write};

use serde_json::json;

fn main() {
    let mut state = ipc::AppState::default();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        // A line that is not a request envelope has no id to reply under.
        let response = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            Err(e) => json!({
                "ok": false,
                "error": { "code": "bad_json", "message": e.to_string() },
            }),
        };

        let encoded = serde_json::to_string(&response)
            .unwrap_or_else(|_| "{\"ok\":false}".to_string());
        let _ = writeln!(out, "{}", encoded);
        let _ = out.flush();
    }
}
