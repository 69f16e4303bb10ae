/// Log ingestion: read run logs from disk, extract properties, and persist
/// them next to the run.
///
/// Logs may be plain text or zstd-compressed (`*.zst`). Properties files are
/// flat JSON objects; extraction merges into an existing file rather than
/// replacing it, so several parsers can contribute to one run.
use crate::error::IngestError;
use crate::parser::Parser;
use crate::record::{PropertyRecord, FAILURES_KEY};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Expand log arguments: glob patterns expand to matching files (sorted),
/// anything else passes through as a literal path.
pub fn expand_log_paths(args: &[String]) -> Result<Vec<PathBuf>, IngestError> {
    let mut paths = Vec::new();
    for arg in args {
        if !arg.contains(['*', '?', '[']) {
            paths.push(PathBuf::from(arg));
            continue;
        }
        let entries = glob::glob(arg).map_err(|e| IngestError::Pattern {
            pattern: arg.clone(),
            source: e,
        })?;
        let before = paths.len();
        for entry in entries {
            match entry {
                Ok(path) => paths.push(path),
                Err(e) => tracing::warn!(error = %e, "skipping unreadable glob match"),
            }
        }
        if paths.len() == before {
            tracing::warn!(pattern = %arg, "log pattern matched no files");
        }
    }
    Ok(paths)
}

/// Read a log file, transparently decompressing `.zst` files.
pub fn read_log(path: &Path) -> Result<String, IngestError> {
    let bytes = std::fs::read(path).map_err(|e| IngestError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let bytes = if path.extension().is_some_and(|ext| ext == "zst") {
        zstd::decode_all(bytes.as_slice()).map_err(|e| IngestError::Decompress {
            path: path.to_path_buf(),
            source: e,
        })?
    } else {
        bytes
    };

    String::from_utf8(bytes).map_err(|_| IngestError::Encoding {
        path: path.to_path_buf(),
    })
}

/// Read and extract one log.
pub fn extract_file(parser: &Parser, path: &Path) -> Result<PropertyRecord, IngestError> {
    let text = read_log(path)?;
    let record = parser.parse(&text);
    tracing::info!(
        log = %path.display(),
        bytes = text.len(),
        properties = record.len(),
        failures = record.failures().len(),
        "extracted run properties"
    );
    Ok(record)
}

/// Load an existing properties file as a raw JSON object; a missing file is empty.
///
/// Values are kept as written, including ones no rule produces (nulls,
/// numeric lists, nested objects), so merging never loses foreign keys.
pub fn load_properties(path: &Path) -> Result<Map<String, Value>, IngestError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => {
            return Err(IngestError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    serde_json::from_str(&contents).map_err(|e| IngestError::Properties {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Overlay `record` onto an existing properties object.
///
/// Record values replace existing keys; extraction failures are appended
/// to any failures already stored. Values with no JSON form (non-finite
/// floats written by a function rule) are skipped rather than stored as null.
pub fn overlay_record(
    properties: &mut Map<String, Value>,
    record: &PropertyRecord,
) -> Result<(), IngestError> {
    for (key, value) in record.iter() {
        let json = serde_json::to_value(value).map_err(IngestError::Serialize)?;
        if json.is_null() {
            tracing::warn!(attribute = %key, ?value, "skipping value with no JSON form");
            continue;
        }
        properties.insert(key.to_string(), json);
    }

    if record.has_failures() {
        let failures = record
            .failures()
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(IngestError::Serialize)?;
        match properties.get_mut(FAILURES_KEY) {
            Some(Value::Array(existing)) => existing.extend(failures),
            _ => {
                properties.insert(FAILURES_KEY.to_string(), Value::Array(failures));
            }
        }
    }
    Ok(())
}

/// Merge `record` into the properties file at `path` and write it atomically.
///
/// Writes to a temporary file in the same directory, then renames, so
/// readers never see a partial write. Returns the merged properties.
pub fn write_properties(
    path: &Path,
    record: &PropertyRecord,
    pretty: bool,
) -> Result<Map<String, Value>, IngestError> {
    let mut merged = load_properties(path)?;
    overlay_record(&mut merged, record)?;

    let json = if pretty {
        serde_json::to_string_pretty(&merged)
    } else {
        serde_json::to_string(&merged)
    }
    .map_err(IngestError::Serialize)?;

    let dir = path.parent().unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("properties");
    let tmp_path = dir.join(format!(".{file_name}.tmp.{}", std::process::id()));

    std::fs::write(&tmp_path, json.as_bytes()).map_err(|e| IngestError::Write {
        path: tmp_path.clone(),
        source: e,
    })?;

    std::fs::rename(&tmp_path, path).map_err(|e| IngestError::Rename {
        from: tmp_path,
        to: path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!(path = %path.display(), properties = merged.len(), "wrote properties");
    Ok(merged)
}
