use crate::ipc::error::{err, ok, store_err};
use crate::ipc::types::{AppState, Request};
use crate::records::StudentDraft;
use serde_json::json;

fn parse_index(req: &Request) -> Result<usize, serde_json::Value> {
    match req.params.get("index").and_then(|v| v.as_u64()) {
        Some(v) => Ok(v as usize),
        None => Err(err(
            &req.id,
            "bad_params",
            "missing/invalid index (expected a non-negative integer)",
            None,
        )),
    }
}

fn parse_draft(req: &Request) -> Result<StudentDraft, serde_json::Value> {
    let Some(v) = req.params.get("student").filter(|v| v.is_object()) else {
        return Err(err(&req.id, "bad_params", "missing/invalid student", None));
    };
    serde_json::from_value::<StudentDraft>(v.clone())
        .map_err(|e| err(&req.id, "bad_params", format!("invalid student: {e}"), None))
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let mut students = Vec::new();
    for (i, r) in store.get_all().iter().enumerate() {
        let mut row = match serde_json::to_value(r) {
            Ok(v) => v,
            Err(e) => return err(&req.id, "storage_failed", e.to_string(), None),
        };
        row["index"] = json!(i);
        row["rowNo"] = json!(i + 1);
        row["remainingFees"] = json!(r.remaining_fees());
        students.push(row);
    }

    ok(
        &req.id,
        json!({ "count": students.len(), "students": students }),
    )
}

fn handle_students_count(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ok(&req.id, json!({ "count": store.count() }))
}

fn handle_students_search(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let query = match req.params.get("query") {
        None => "",
        Some(v) => match v.as_str() {
            Some(s) => s,
            None => return err(&req.id, "bad_params", "query must be a string", None),
        },
    };
    let indices: Vec<usize> = store.search(query).collect();
    ok(&req.id, json!({ "indices": indices }))
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let draft = match parse_draft(req) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    if let Err(e) = store.add(&draft) {
        return store_err(&req.id, &e);
    }
    let count = store.count();
    ok(&req.id, json!({ "index": count.saturating_sub(1), "count": count }))
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let index = match parse_index(req) {
        Ok(i) => i,
        Err(resp) => return resp,
    };
    let draft = match parse_draft(req) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    match store.update(index, &draft) {
        Ok(()) => ok(&req.id, json!({ "index": index })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let index = match parse_index(req) {
        Ok(i) => i,
        Err(resp) => return resp,
    };
    match store.remove(index) {
        Ok(()) => ok(&req.id, json!({ "count": store.count() })),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.count" => Some(handle_students_count(state, req)),
        "students.search" => Some(handle_students_search(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}
