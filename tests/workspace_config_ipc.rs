mod test_support;

use serde_json::json;
use test_support::{asha, request_err_code, request_ok, spawn_sidecar, temp_dir};

#[test]
fn config_file_and_params_select_storage_key_and_strictness() {
    let workspace = temp_dir("feesd-config");
    std::fs::write(
        workspace.join("feesd.config.json"),
        r#"{ "storageKey": "bca_year3_students_data", "exportFileName": "BCA_Year3_Students.csv" }"#,
    )
    .expect("write config");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(opened["storageKey"], "bca_year3_students_data");
    assert_eq!(opened["strictUpdates"], false);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({ "student": asha() }),
    );
    let exported = request_ok(&mut stdin, &mut reader, "3", "students.exportCsv", json!({}));
    assert_eq!(exported["fileName"], "BCA_Year3_Students.csv");

    // Same database, different key: a separate, empty roster.
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "workspace.select",
        json!({
            "path": workspace.to_string_lossy(),
            "storageKey": "bca_year2_students_data",
            "strictUpdates": true
        }),
    );
    assert_eq!(opened["studentCount"], 0);
    assert_eq!(opened["strictUpdates"], true);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.create",
        json!({ "student": asha() }),
    );
    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "6",
        "students.update",
        json!({ "index": 0, "student": { "roll": "101", "name": "Asha", "totalFees": "lots" } }),
    );
    assert_eq!(code, "validation_failed");

    let health = request_ok(&mut stdin, &mut reader, "7", "health", json!({}));
    assert_eq!(health["storageKey"], "bca_year2_students_data");

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn broken_config_file_does_not_block_workspace() {
    let workspace = temp_dir("feesd-config-broken");
    std::fs::write(workspace.join("feesd.config.json"), "{ not json").expect("write config");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(opened["storageKey"], "bca_year2_students_data");

    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy(), "storageKey": "" }),
    );
    assert_eq!(code, "bad_params");

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn corrupt_slot_reads_as_empty_roster() {
    let workspace = temp_dir("feesd-config-corrupt-slot");
    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar();
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
        drop(stdin);
        let _ = child.wait();
    }
    let conn = rusqlite::Connection::open(workspace.join("feesd.sqlite3")).expect("open db");
    conn.execute(
        "INSERT INTO slots(key, value) VALUES('bca_year2_students_data', '[{\"roll\":')",
        [],
    )
    .expect("seed corrupt slot");
    drop(conn);

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(opened["studentCount"], 0);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({ "student": asha() }),
    );
    let count = request_ok(&mut stdin, &mut reader, "3", "students.count", json!({}));
    assert_eq!(count["count"], 1);

    let _ = std::fs::remove_dir_all(workspace);
}
