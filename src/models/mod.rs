//! Data models for sitelog entities.
//!
//! This module defines the core data structures:
//! - `Task` - A single logged work entry with notes, materials, tools and photos
//! - `Job` - A work site owning an ordered list of tasks
//! - `StateDocument` - The versioned top-level shape persisted to the store

pub mod migrate;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single logged work entry within a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier (e.g., "tsk-a1b2c3d4")
    pub id: String,

    /// Entry title
    pub title: String,

    /// Free-form notes, may be empty
    #[serde(default)]
    pub description: String,

    /// Free-text time estimate (e.g. "2 hours", "30 mins", "2").
    /// Not validated at input time; parsed lazily by the aggregator.
    #[serde(default)]
    pub estimated_time: String,

    /// Materials needed, order preserved, duplicates allowed
    #[serde(default)]
    pub materials: Vec<String>,

    /// Tools needed, order preserved, duplicates allowed
    #[serde(default)]
    pub tools: Vec<String>,

    /// Encoded photo data URIs, insertion order = upload order
    #[serde(default)]
    pub image_urls: Vec<String>,

    /// Completion marker, kept for schema compatibility.
    /// No operation currently sets it.
    #[serde(default)]
    pub is_completed: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a new task with the given ID and title.
    pub fn new(id: String, title: String) -> Self {
        Self {
            id,
            title,
            description: String::new(),
            estimated_time: String::new(),
            materials: Vec::new(),
            tools: Vec::new(),
            image_urls: Vec::new(),
            is_completed: false,
            created_at: Utc::now(),
        }
    }
}

/// A work site / project, the top-level organizational unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique identifier (e.g., "job-a1b2c3d4")
    pub id: String,

    /// Street address or site name, the primary label
    pub address: String,

    /// Optional client name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,

    /// Tasks recorded for this site, newest-first
    #[serde(default)]
    pub tasks: Vec<Task>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp, refreshed on every task add/delete
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new job with the given ID and address.
    pub fn new(id: String, address: String, client_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            address,
            client_name,
            tasks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// The versioned top-level document persisted under the store's jobs key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateDocument {
    /// Schema version marker, see `migrate::CURRENT_SCHEMA_VERSION`
    pub schema_version: u32,

    /// All recorded jobs, newest-first
    pub jobs: Vec<Job>,
}

/// Split a comma-delimited input into cleaned items.
///
/// Each segment is trimmed and empty segments are discarded. Order is
/// preserved and duplicates are kept; deduplication happens later in the
/// aggregator where it applies.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Generate a unique ID for a job or task.
///
/// Format: `<prefix>-<8 hex chars>`
/// - Job prefix: "job"
/// - Task prefix: "tsk"
pub fn generate_id(prefix: &str, seed: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(
        chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or(0)
            .to_le_bytes(),
    );
    let hash = hasher.finalize();
    let hash_hex = format!("{:x}", hash);
    format!("{}-{}", prefix, &hash_hex[..8])
}
