//! Schema migration for persisted documents.
//!
//! Persisted state carries a `schema_version` marker. Loading applies a
//! chain of named migration steps to the raw JSON until the document is
//! at `CURRENT_SCHEMA_VERSION`, then hands it to typed deserialization.
//!
//! Version history:
//! - v1: a bare JSON array of jobs; tasks carried a singular optional
//!   `image_url` string.
//! - v2: `{ "schema_version": 2, "jobs": [...] }`; tasks carry an
//!   `image_urls` array.

use serde_json::{Value, json};

use crate::{Error, Result};

/// Version written by this build. Documents at this version load as-is.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Determine the schema version of a raw document.
///
/// Version-1 documents predate the version marker and are recognized by
/// their bare-array shape.
fn document_version(raw: &Value) -> Option<u32> {
    if raw.is_array() {
        return Some(1);
    }
    raw.get("schema_version")?.as_u64().map(|v| v as u32)
}

/// Migrate a raw persisted document to the current schema version.
///
/// Idempotent: a current-version document passes through unchanged. A
/// document from a newer build is rejected rather than guessed at.
pub fn migrate_document(mut raw: Value) -> Result<Value> {
    let mut version = document_version(&raw)
        .ok_or_else(|| Error::Other("persisted document has no schema version".to_string()))?;

    if version > CURRENT_SCHEMA_VERSION {
        return Err(Error::UnsupportedSchema(version));
    }

    while version < CURRENT_SCHEMA_VERSION {
        raw = match version {
            1 => lift_single_image_url(raw)?,
            v => return Err(Error::UnsupportedSchema(v)),
        };
        version += 1;
    }

    Ok(raw)
}

/// v1 -> v2: replace each task's singular `image_url` with an `image_urls`
/// list and wrap the bare job array in a versioned document.
///
/// A task with a non-empty `image_url` yields `image_urls = [image_url]`;
/// a task with an empty or missing `image_url` yields `image_urls = []`.
fn lift_single_image_url(raw: Value) -> Result<Value> {
    let Value::Array(mut jobs) = raw else {
        return Err(Error::Other(
            "version 1 document is not a job array".to_string(),
        ));
    };

    for job in &mut jobs {
        let Some(tasks) = job.get_mut("tasks").and_then(Value::as_array_mut) else {
            continue;
        };
        for task in tasks {
            lift_task_image_urls(task);
        }
    }

    Ok(json!({
        "schema_version": 2,
        "jobs": jobs,
    }))
}

/// Apply the `image_url` -> `image_urls` transform to a single raw task.
fn lift_task_image_urls(task: &mut Value) {
    let Some(obj) = task.as_object_mut() else {
        return;
    };

    let legacy = obj.remove("image_url");
    if obj.contains_key("image_urls") {
        return;
    }

    let urls = match legacy {
        Some(Value::String(url)) if !url.is_empty() => vec![Value::String(url)],
        _ => Vec::new(),
    };
    obj.insert("image_urls".to_string(), Value::Array(urls));
}
