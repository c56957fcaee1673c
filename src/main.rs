mod backup;
mod config;
mod csv;
mod db;
mod ipc;
mod log;
mod records;
mod store;

use std::io::{self, BufRead, Write};

fn main() {
    let mut state = ipc::AppState::default();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id; answer with an anonymous error line.
                let error = e.to_string();
                log::warn("REQUEST_BAD_JSON", &[("error", error.as_str())]);
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": error },
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let text = match serde_json::to_string(&resp) {
            Ok(t) => t,
            Err(e) => {
                let error = e.to_string();
                log::error("RESPONSE_SERIALIZE_FAILED", &[("error", error.as_str())]);
                "{\"ok\":false}".to_string()
            }
        };
        let _ = writeln!(stdout, "{}", text);
        let _ = stdout.flush();
    }
}
