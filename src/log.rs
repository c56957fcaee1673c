//! One-line JSON events on stderr. stdout belongs to the protocol.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn info(event: &str, fields: &[(&str, &str)]) {
    log(Severity::Info, event, fields);
}

pub fn warn(event: &str, fields: &[(&str, &str)]) {
    log(Severity::Warn, event, fields);
}

pub fn error(event: &str, fields: &[(&str, &str)]) {
    log(Severity::Error, event, fields);
}

pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
    let line = format_line(severity, event, fields);
    let mut stderr = io::stderr().lock();
    // Logging must never take the sidecar down.
    let _ = writeln!(stderr, "{}", line);
    let _ = stderr.flush();
}

/// Keys are emitted in sorted order so identical events produce identical lines.
pub fn format_line(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut obj: BTreeMap<&str, serde_json::Value> = BTreeMap::new();
    for (k, v) in fields {
        obj.insert(*k, serde_json::Value::String((*v).to_string()));
    }
    obj.insert("event", serde_json::Value::String(event.to_string()));
    obj.insert(
        "severity",
        serde_json::Value::String(severity.as_str().to_string()),
    );
    serde_json::to_string(&obj).unwrap_or_else(|_| format!("{{\"event\":\"{}\"}}", event))
}
