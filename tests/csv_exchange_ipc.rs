mod test_support;

use serde_json::json;
use test_support::{request_err_code, request_ok, spawn_sidecar, student, temp_dir};

#[test]
fn export_file_then_import_into_fresh_workspace_roundtrips() {
    let src = temp_dir("feesd-csv-src");
    let dst = temp_dir("feesd-csv-dst");
    let out_dir = temp_dir("feesd-csv-out");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": src.to_string_lossy() }),
    );
    let seeded = [
        student("101", "Asha", 50000.0, 20000.0),
        student("102", "Ravi Kumar", 42000.5, 0.0),
        student("103", "Meera", 0.0, 0.0),
    ];
    for (i, s) in seeded.iter().enumerate() {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("add-{i}"),
            "students.create",
            json!({ "student": s }),
        );
    }
    let before = request_ok(&mut stdin, &mut reader, "2", "students.list", json!({}));

    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.exportCsv",
        json!({ "outDir": out_dir.to_string_lossy() }),
    );
    let path = exported["path"].as_str().expect("export path").to_string();
    assert!(path.ends_with("BCA_Year2_Students.csv"));
    let text = std::fs::read_to_string(&path).expect("read export");
    assert!(text.starts_with("sep=,\n"));
    assert_eq!(text.lines().count(), 5);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "workspace.select",
        json!({ "path": dst.to_string_lossy() }),
    );
    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.importCsv",
        json!({ "inPath": path }),
    );
    assert_eq!(imported["imported"], 3);
    assert_eq!(imported["skipped"], 0);

    let after = request_ok(&mut stdin, &mut reader, "6", "students.list", json!({}));
    assert_eq!(after["students"], before["students"]);

    let _ = std::fs::remove_dir_all(src);
    let _ = std::fs::remove_dir_all(dst);
    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn import_replaces_store_and_reports_short_rows() {
    let workspace = temp_dir("feesd-csv-short-rows");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    for i in 0..4 {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("add-{i}"),
            "students.create",
            json!({ "student": student(&format!("9{i}"), "Old", 10.0, 1.0) }),
        );
    }

    let text = [
        "sep=,",
        r#""S.No","Roll No","Name""#,
        r#""1","201","Kiran","3rd","Computer Applications","9","9","k@x.com","₹800","₹300","₹500""#,
        r#""2","202","Short","3rd","Computer Applications","9","9","s@x.com","₹800""#,
        "",
        r#""3","203","Lata","4th","Computer Applications","9","9","l@x.com","₹900","₹900","₹0""#,
    ]
    .join("\n");
    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.importCsv",
        json!({ "text": text }),
    );
    assert_eq!(imported["imported"], 2);
    assert_eq!(imported["skipped"], 1);
    assert_eq!(imported["warnings"][0]["line"], 4);
    assert_eq!(imported["warnings"][0]["code"], "bad_columns");

    let list = request_ok(&mut stdin, &mut reader, "3", "students.list", json!({}));
    let rows = list["students"].as_array().expect("students");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["roll"], "201");
    assert_eq!(rows[1]["name"], "Lata");
    assert_eq!(rows[1]["remainingFees"].as_f64(), Some(0.0));

    let emptied = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.importCsv",
        json!({ "text": "sep=,\n\"S.No\",\"Roll No\"" }),
    );
    assert_eq!(emptied["imported"], 0);
    let count = request_ok(&mut stdin, &mut reader, "5", "students.count", json!({}));
    assert_eq!(count["count"], 0);

    let code = request_err_code(&mut stdin, &mut reader, "6", "students.importCsv", json!({}));
    assert_eq!(code, "bad_params");
    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "7",
        "students.importCsv",
        json!({ "inPath": workspace.join("missing.csv").to_string_lossy() }),
    );
    assert_eq!(code, "io_failed");

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn names_with_commas_and_quotes_survive_export_import() {
    let workspace = temp_dir("feesd-csv-quoting");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({ "student": student("104", "Das, \"Rinku\"", 100.0, 50.0) }),
    );
    let exported = request_ok(&mut stdin, &mut reader, "3", "students.exportCsv", json!({}));
    let csv = exported["csv"].as_str().expect("csv").to_string();
    assert!(csv.contains(r#""Das, ""Rinku""""#));

    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.importCsv",
        json!({ "text": csv }),
    );
    assert_eq!(imported["imported"], 1);
    let list = request_ok(&mut stdin, &mut reader, "5", "students.list", json!({}));
    assert_eq!(list["students"][0]["name"], "Das, \"Rinku\"");

    let _ = std::fs::remove_dir_all(workspace);
}
