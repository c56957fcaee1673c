use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const RECORDS_ENTRY: &str = "records.json";
const CSV_ENTRY: &str = "students.csv";
pub const BUNDLE_FORMAT_V1: &str = "feesd-workspace-v1";
pub const LEGACY_JSON_FORMAT: &str = "legacy-json";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub records_sha256: String,
}

#[derive(Debug, Clone)]
pub struct ImportedBundle {
    pub bundle_format_detected: String,
    /// Slot payload exactly as it was exported.
    pub records_json: String,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Writes `records_json` (the raw slot payload) plus a CSV rendering of it.
pub fn export_workspace_bundle(
    records_json: &str,
    record_count: usize,
    csv_text: &str,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let records_sha256 = sha256_hex(records_json.as_bytes());
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": chrono::Utc::now().to_rfc3339(),
        "recordCount": record_count,
        "recordsSha256": records_sha256,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(RECORDS_ENTRY, opts)
        .context("failed to start records entry")?;
    zip.write_all(records_json.as_bytes())
        .context("failed to write records entry")?;

    zip.start_file(CSV_ENTRY, opts)
        .context("failed to start csv entry")?;
    zip.write_all(csv_text.as_bytes())
        .context("failed to write csv entry")?;

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: 3,
        records_sha256,
    })
}

/// Reads a bundle back. A plain file holding a JSON array is accepted as a
/// raw dump of the slot.
pub fn import_workspace_bundle(in_path: &Path) -> anyhow::Result<ImportedBundle> {
    if !is_zip_file(in_path)? {
        let text = std::fs::read_to_string(in_path)
            .with_context(|| format!("failed to read {}", in_path.to_string_lossy()))?;
        let value: serde_json::Value =
            serde_json::from_str(&text).context("legacy dump is invalid JSON")?;
        if !value.is_array() {
            return Err(anyhow!("legacy dump must be a JSON array of records"));
        }
        return Ok(ImportedBundle {
            bundle_format_detected: LEGACY_JSON_FORMAT.to_string(),
            records_json: text,
        });
    }

    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }

    let mut records_json = String::new();
    archive
        .by_name(RECORDS_ENTRY)
        .context("bundle missing records.json")?
        .read_to_string(&mut records_json)
        .context("failed to read records.json")?;

    let expected = manifest
        .get("recordsSha256")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let actual = sha256_hex(records_json.as_bytes());
    if expected != actual {
        return Err(anyhow!(
            "records.json checksum mismatch: manifest {} vs content {}",
            expected,
            actual
        ));
    }

    Ok(ImportedBundle {
        bundle_format_detected: BUNDLE_FORMAT_V1.to_string(),
        records_json,
    })
}

fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 4];
    let read = f.read(&mut sig).context("failed to read file signature")?;
    if read < 4 {
        return Ok(false);
    }
    Ok(sig == [0x50, 0x4B, 0x03, 0x04])
}
