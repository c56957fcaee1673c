use std::path::PathBuf;

use serde::Deserialize;

use crate::store::{RecordStore, SqliteSlot};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Default)]
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<RecordStore<SqliteSlot>>,
}
