use crate::config::StoreConfig;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::log;
use crate::store::{RecordStore, SqliteSlot};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "storageKey": state.store.as_ref().map(|s| s.config().storage_key.clone()),
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    // Best-effort: a broken config file must not prevent the workspace from opening.
    let base = match StoreConfig::from_workspace(&path) {
        Ok(Some(cfg)) => cfg,
        Ok(None) => StoreConfig::default(),
        Err(e) => {
            let error = format!("{e:#}");
            log::warn("CONFIG_FILE_IGNORED", &[("error", error.as_str())]);
            StoreConfig::default()
        }
    };
    let config = match base.with_overrides(&req.params) {
        Ok(c) => c,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };

    match SqliteSlot::open(&path) {
        Ok(slot) => {
            let store = RecordStore::new(slot, config);
            let student_count = store.count();
            let workspace = path.to_string_lossy().to_string();
            log::info(
                "WORKSPACE_OPENED",
                &[
                    ("path", workspace.as_str()),
                    ("storageKey", store.config().storage_key.as_str()),
                ],
            );
            let result = json!({
                "workspacePath": workspace,
                "storageKey": store.config().storage_key,
                "strictUpdates": store.config().strict_updates,
                "studentCount": student_count,
            });
            state.workspace = Some(path);
            state.store = Some(store);
            ok(&req.id, result)
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
