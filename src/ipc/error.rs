use crate::store::StoreError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn store_err(id: &str, e: &StoreError) -> serde_json::Value {
    match e {
        StoreError::Validation(v) => err(
            id,
            "validation_failed",
            v.to_string(),
            Some(json!({ "field": v.field() })),
        ),
        StoreError::Index(ix) => err(
            id,
            "index_out_of_range",
            ix.to_string(),
            Some(json!({ "index": ix.index, "len": ix.len })),
        ),
        StoreError::Storage(_) => err(id, "storage_failed", e.to_string(), None),
    }
}
