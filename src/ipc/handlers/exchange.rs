use crate::backup;
use crate::csv::MIN_IMPORT_FIELDS;
use crate::ipc::error::{err, ok, store_err};
use crate::ipc::types::{AppState, Request};
use crate::log;
use crate::records::StudentRecord;
use serde_json::json;
use std::path::{Path, PathBuf};

struct HandlerErr {
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
}

impl HandlerErr {
    fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

fn optional_str<'a>(req: &'a Request, key: &str) -> Result<Option<&'a str>, HandlerErr> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v.as_str().map(Some).ok_or_else(|| HandlerErr {
            code: "bad_params",
            message: format!("{key} must be a string"),
            details: None,
        }),
    }
}

fn write_text_file(path: &Path, contents: &str) -> Result<(), HandlerErr> {
    let io_err = |e: std::io::Error| HandlerErr {
        code: "io_failed",
        message: e.to_string(),
        details: Some(json!({ "path": path.to_string_lossy() })),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, contents).map_err(io_err)?;
    Ok(())
}

fn handle_export_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let out_path = match (optional_str(req, "outPath"), optional_str(req, "outDir")) {
        (Ok(Some(p)), _) => Some(PathBuf::from(p)),
        (Ok(None), Ok(Some(dir))) => Some(Path::new(dir).join(&store.config().export_file_name)),
        (Ok(None), Ok(None)) => None,
        (Err(e), _) | (_, Err(e)) => return e.response(&req.id),
    };

    let csv = store.export_csv();
    let rows_exported = store.count();
    if let Some(path) = out_path.as_ref() {
        if let Err(e) = write_text_file(path, &csv) {
            return e.response(&req.id);
        }
    }

    ok(
        &req.id,
        json!({
            "csv": csv,
            "rowsExported": rows_exported,
            "fileName": store.config().export_file_name,
            "path": out_path.map(|p| p.to_string_lossy().to_string()),
        }),
    )
}

fn handle_import_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let text = match (optional_str(req, "text"), optional_str(req, "inPath")) {
        (Ok(Some(t)), _) => t.to_string(),
        (Ok(None), Ok(Some(p))) => match std::fs::read_to_string(p) {
            Ok(t) => t,
            Err(e) => {
                return err(
                    &req.id,
                    "io_failed",
                    e.to_string(),
                    Some(json!({ "path": p })),
                )
            }
        },
        (Ok(None), Ok(None)) => {
            return err(&req.id, "bad_params", "missing text or inPath", None);
        }
        (Err(e), _) | (_, Err(e)) => return e.response(&req.id),
    };

    let summary = match store.import_csv(&text) {
        Ok(s) => s,
        Err(e) => return store_err(&req.id, &e),
    };

    let imported = summary.imported.to_string();
    let skipped = summary.skipped.len().to_string();
    log::info(
        "CSV_IMPORT_COMPLETE",
        &[("imported", imported.as_str()), ("skipped", skipped.as_str())],
    );
    if !summary.skipped.is_empty() {
        let lines = summary
            .skipped
            .iter()
            .map(|s| s.line.to_string())
            .collect::<Vec<_>>()
            .join(",");
        log::warn(
            "CSV_ROWS_SKIPPED",
            &[("lines", lines.as_str()), ("skipped", skipped.as_str())],
        );
    }

    let warnings: Vec<serde_json::Value> = summary
        .skipped
        .iter()
        .map(|s| {
            json!({
                "line": s.line,
                "code": "bad_columns",
                "message": format!("expected at least {MIN_IMPORT_FIELDS} CSV columns, found {}", s.fields),
            })
        })
        .collect();

    ok(
        &req.id,
        json!({
            "imported": summary.imported,
            "skipped": summary.skipped.len(),
            "warnings": warnings,
        }),
    )
}

fn handle_export_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let out_path = match optional_str(req, "outPath") {
        Ok(Some(p)) => PathBuf::from(p),
        Ok(None) => return err(&req.id, "bad_params", "missing outPath", None),
        Err(e) => return e.response(&req.id),
    };

    let records = store.get_all();
    let records_json = match serde_json::to_string(&records) {
        Ok(t) => t,
        Err(e) => return err(&req.id, "bundle_failed", e.to_string(), None),
    };
    let csv = store.export_csv();

    match backup::export_workspace_bundle(&records_json, records.len(), &csv, &out_path) {
        Ok(summary) => {
            let path = out_path.to_string_lossy().to_string();
            log::info(
                "BUNDLE_EXPORTED",
                &[
                    ("path", path.as_str()),
                    ("sha256", summary.records_sha256.as_str()),
                ],
            );
            ok(
                &req.id,
                json!({
                    "path": path,
                    "bundleFormat": summary.bundle_format,
                    "entryCount": summary.entry_count,
                    "recordCount": records.len(),
                    "recordsSha256": summary.records_sha256,
                }),
            )
        }
        Err(e) => err(&req.id, "bundle_failed", format!("{e:#}"), None),
    }
}

fn handle_import_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let in_path = match optional_str(req, "inPath") {
        Ok(Some(p)) => PathBuf::from(p),
        Ok(None) => return err(&req.id, "bad_params", "missing inPath", None),
        Err(e) => return e.response(&req.id),
    };

    let bundle = match backup::import_workspace_bundle(&in_path) {
        Ok(b) => b,
        Err(e) => return err(&req.id, "bundle_failed", format!("{e:#}"), None),
    };
    let records: Vec<StudentRecord> =
        match serde_json::from_str::<Option<Vec<StudentRecord>>>(&bundle.records_json) {
            Ok(v) => v.unwrap_or_default(),
            Err(e) => {
                return err(
                    &req.id,
                    "bundle_failed",
                    format!("records.json does not hold student records: {e}"),
                    None,
                )
            }
        };
    if let Err(e) = store.replace_all(&records) {
        return store_err(&req.id, &e);
    }

    let imported = records.len().to_string();
    log::info(
        "BUNDLE_IMPORTED",
        &[
            ("format", bundle.bundle_format_detected.as_str()),
            ("imported", imported.as_str()),
        ],
    );
    ok(
        &req.id,
        json!({
            "bundleFormatDetected": bundle.bundle_format_detected,
            "imported": records.len(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.exportCsv" => Some(handle_export_csv(state, req)),
        "students.importCsv" => Some(handle_import_csv(state, req)),
        "workspace.exportBundle" => Some(handle_export_bundle(state, req)),
        "workspace.importBundle" => Some(handle_import_bundle(state, req)),
        _ => None,
    }
}
