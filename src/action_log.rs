//! Action logging for sitelog commands.
//!
//! Every CLI invocation appends a structured JSONL record to
//! `<data_dir>/action.log`. Logging never fails a command; errors degrade
//! to a stderr warning.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a single action log entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionLog {
    /// ISO 8601 timestamp when the action occurred
    pub timestamp: DateTime<Utc>,

    /// Command name (e.g., "job add", "export")
    pub command: String,

    /// Command arguments as JSON
    pub args: serde_json::Value,

    /// Whether the command succeeded
    pub success: bool,

    /// Error message if the command failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Command execution duration in milliseconds
    pub duration_ms: u64,

    /// User who executed the command
    pub user: String,
}

/// Log an action to `<data_dir>/action.log`.
///
/// This function never fails - it silently falls back on errors to avoid
/// breaking commands due to logging issues.
pub fn log_action(
    data_dir: &Path,
    enabled: bool,
    command: &str,
    args: serde_json::Value,
    success: bool,
    error: Option<String>,
    duration_ms: u64,
) {
    if !enabled {
        return;
    }

    let entry = ActionLog {
        timestamp: Utc::now(),
        command: command.to_string(),
        args: sanitize_args(&args),
        success,
        error,
        duration_ms,
        user: get_current_user(),
    };

    if let Err(e) = write_log_entry(data_dir, &entry) {
        eprintln!("Warning: failed to write action log: {}", e);
    }
}

/// Append a log entry to `<data_dir>/action.log`.
fn write_log_entry(data_dir: &Path, entry: &ActionLog) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(data_dir)?;

    let json = serde_json::to_string(entry)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join("action.log"))?;
    writeln!(file, "{}", json)?;
    Ok(())
}

/// Trim arguments down to something worth keeping: file paths become
/// basenames, long strings (photo data URIs in particular) are truncated,
/// and large arrays are summarized.
fn sanitize_args(args: &serde_json::Value) -> serde_json::Value {
    match args {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), sanitize_args(value)))
                .collect(),
        ),
        serde_json::Value::Array(arr) => {
            if arr.len() > 10 {
                serde_json::Value::String(format!("[Array with {} items]", arr.len()))
            } else {
                serde_json::Value::Array(arr.iter().map(sanitize_args).collect())
            }
        }
        serde_json::Value::String(s) => {
            let sanitized = if s.contains('/') || s.contains('\\') {
                s.rsplit(['/', '\\']).next().unwrap_or(s).to_string()
            } else {
                s.clone()
            };

            if sanitized.len() > 100 {
                serde_json::Value::String(format!(
                    "{}... ({} chars)",
                    &sanitized[..97],
                    sanitized.len()
                ))
            } else {
                serde_json::Value::String(sanitized)
            }
        }
        _ => args.clone(),
    }
}

/// Get the current user's username.
fn get_current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
