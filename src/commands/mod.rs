//! Command implementations for the sitelog CLI.
//!
//! This module contains the business logic for each CLI command. Every
//! command returns a typed result implementing `Output`, which the binary
//! renders as JSON (the default) or human-readable text (`-H`).
//!
//! Commands that mutate state carry the workspace's sticky storage warning
//! in their result so a rejected write stays user-visible until a later
//! write succeeds.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::images::{EncodeQueue, JpegEncoder};
use crate::models::{Job, Task};
use crate::state::{NewTask, Workspace};
use crate::store::FileStore;
use crate::summary::{self, JobTotals};
use crate::{Error, Result};

/// The sticky message shown while the store refuses writes.
pub const STORAGE_FULL_WARNING: &str =
    "Storage full! Delete some photos or old jobs to save new data.";

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn to_json_string<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

fn warning_suffix(storage_warning: bool) -> String {
    if storage_warning {
        format!("\nWarning: {}", STORAGE_FULL_WARNING)
    } else {
        String::new()
    }
}

/// Open the workspace stored under `data_dir`.
pub fn open_workspace(data_dir: &Path, config: &Config) -> Workspace {
    Workspace::load(Box::new(FileStore::new(
        data_dir.to_path_buf(),
        config.max_store_bytes,
    )))
}

// === Job commands ===

/// Result of `slg job add`.
#[derive(Debug, Serialize)]
pub struct JobAddResult {
    pub job: Job,
    pub storage_warning: bool,
}

impl Output for JobAddResult {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Created job {} \"{}\"{}",
            self.job.id,
            self.job.address,
            warning_suffix(self.storage_warning)
        )
    }
}

/// Create a new job. A blank address is rejected at the boundary.
pub fn job_add(ws: &mut Workspace, address: &str, client: Option<&str>) -> Result<JobAddResult> {
    let Some(job) = ws.create_job(address, client)? else {
        return Err(Error::InvalidInput(
            "job address cannot be empty".to_string(),
        ));
    };
    Ok(JobAddResult {
        job,
        storage_warning: ws.storage_warning(),
    })
}

/// Result of `slg job rm`.
#[derive(Debug, Serialize)]
pub struct JobRmResult {
    pub id: String,
    pub removed: bool,
    pub storage_warning: bool,
}

impl Output for JobRmResult {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        if self.removed {
            format!(
                "Removed job {}{}",
                self.id,
                warning_suffix(self.storage_warning)
            )
        } else {
            format!("No job found with id {}", self.id)
        }
    }
}

/// Remove a job. Removing an unknown id is a no-op, not an error.
pub fn job_rm(ws: &mut Workspace, id: &str) -> Result<JobRmResult> {
    let removed = ws.delete_job(id)?;
    if removed {
        ws.clear_selection_if(id);
    }
    Ok(JobRmResult {
        id: id.to_string(),
        removed,
        storage_warning: ws.storage_warning(),
    })
}

/// One row of the dashboard listing.
#[derive(Debug, Serialize)]
pub struct JobRow {
    pub id: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    pub task_count: usize,
    pub updated_at: DateTime<Utc>,
}

/// Result of `slg job list`.
#[derive(Debug, Serialize)]
pub struct JobListResult {
    pub jobs: Vec<JobRow>,
}

impl Output for JobListResult {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        if self.jobs.is_empty() {
            return "No jobs recorded.".to_string();
        }
        let mut lines = Vec::with_capacity(self.jobs.len());
        for row in &self.jobs {
            let client = row
                .client_name
                .as_deref()
                .map(|c| format!(" ({})", c))
                .unwrap_or_default();
            lines.push(format!(
                "{}  {}{} - {} entries, updated {}",
                row.id,
                row.address,
                client,
                row.task_count,
                row.updated_at.format("%Y-%m-%d")
            ));
        }
        lines.join("\n")
    }
}

/// List all jobs, newest first (the dashboard view).
pub fn job_list(ws: &Workspace) -> JobListResult {
    JobListResult {
        jobs: ws
            .jobs()
            .iter()
            .map(|job| JobRow {
                id: job.id.clone(),
                address: job.address.clone(),
                client_name: job.client_name.clone(),
                task_count: job.tasks.len(),
                updated_at: job.updated_at,
            })
            .collect(),
    }
}

// === Detail view ===

/// Result of `slg show`.
#[derive(Debug, Serialize)]
pub struct ShowResult {
    pub job: Job,
}

impl Output for ShowResult {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        let job = &self.job;
        let mut out = format!("Job {}: {}\n", job.id, job.address);
        if let Some(client) = &job.client_name {
            out.push_str(&format!("Client: {}\n", client));
        }
        out.push_str(&format!(
            "Created: {}\nEntries: {}\n",
            job.created_at.format("%Y-%m-%d"),
            job.tasks.len()
        ));

        for (index, task) in job.tasks.iter().enumerate() {
            out.push_str(&format!(
                "\n#{} {} ({})\n",
                index + 1,
                task.title.to_uppercase(),
                task.id
            ));
            if !task.estimated_time.is_empty() {
                out.push_str(&format!("   Time Est: {}\n", task.estimated_time));
            }
            if !task.description.is_empty() {
                out.push_str(&format!("   Notes: {}\n", task.description));
            }
            if !task.materials.is_empty() {
                out.push_str(&format!("   Materials: {}\n", task.materials.join(", ")));
            }
            if !task.tools.is_empty() {
                out.push_str(&format!("   Tools: {}\n", task.tools.join(", ")));
            }
            if !task.image_urls.is_empty() {
                out.push_str(&format!("   Photos: {}\n", task.image_urls.len()));
            }
        }
        out.trim_end().to_string()
    }
}

/// Show a job and its entries (the job-detail view). Selects the job as
/// the active one for the rest of the invocation.
pub fn show(ws: &mut Workspace, id: &str) -> Result<ShowResult> {
    if !ws.select_job(id) {
        return Err(Error::NotFound(format!("no job with id {}", id)));
    }
    let job = ws
        .active_job()
        .ok_or_else(|| Error::NotFound(format!("no job with id {}", id)))?
        .clone();
    Ok(ShowResult { job })
}

// === Task commands ===

/// Result of `slg task add`.
#[derive(Debug, Serialize)]
pub struct TaskAddResult {
    pub job_id: String,
    pub task: Task,
    /// Photos that could not be re-encoded and were attached as-is.
    pub photo_fallbacks: usize,
    pub storage_warning: bool,
}

impl Output for TaskAddResult {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!(
            "Recorded entry {} \"{}\" under {}",
            self.task.id, self.task.title, self.job_id
        );
        if !self.task.image_urls.is_empty() {
            out.push_str(&format!("\nAttached {} photo(s)", self.task.image_urls.len()));
        }
        if self.photo_fallbacks > 0 {
            out.push_str(&format!(
                "\nNote: {} photo(s) could not be re-encoded and were attached as-is",
                self.photo_fallbacks
            ));
        }
        out.push_str(&warning_suffix(self.storage_warning));
        out
    }
}

/// Input for `task_add`, mirroring the entry form fields.
#[derive(Debug, Default)]
pub struct TaskAddArgs {
    pub title: String,
    pub time: Option<String>,
    pub notes: Option<String>,
    pub materials: Option<String>,
    pub tools: Option<String>,
    pub photos: Vec<PathBuf>,
}

/// Record a new entry under a job.
///
/// Photos are read up front; a file that cannot be read aborts the whole
/// command and discards the pending batch, before any record is created.
/// Individual photos that fail to re-encode fall back to their original
/// bytes.
pub fn task_add(ws: &mut Workspace, job_id: &str, args: TaskAddArgs) -> Result<TaskAddResult> {
    if ws.job(job_id).is_none() {
        return Err(Error::NotFound(format!("no job with id {}", job_id)));
    }
    if args.title.trim().is_empty() {
        return Err(Error::InvalidInput("entry title cannot be empty".to_string()));
    }

    let mut queue = EncodeQueue::new();
    for path in &args.photos {
        let raw = std::fs::read(path).map_err(|e| {
            Error::InvalidInput(format!("could not read photo {}: {}", path.display(), e))
        })?;
        queue.push(raw);
    }
    let encoded = queue.process_all(&JpegEncoder::new());
    let photo_fallbacks = encoded.iter().filter(|img| img.fallback).count();

    let input = NewTask {
        title: args.title,
        estimated_time: args.time.unwrap_or_default(),
        description: args.notes.unwrap_or_default(),
        materials_raw: args.materials.unwrap_or_default(),
        tools_raw: args.tools.unwrap_or_default(),
        image_urls: encoded.into_iter().map(|img| img.data_uri).collect(),
    };

    let task = ws
        .create_task(job_id, input)?
        .ok_or_else(|| Error::Other("entry was rejected".to_string()))?;

    Ok(TaskAddResult {
        job_id: job_id.to_string(),
        task,
        photo_fallbacks,
        storage_warning: ws.storage_warning(),
    })
}

/// Result of `slg task rm`.
#[derive(Debug, Serialize)]
pub struct TaskRmResult {
    pub job_id: String,
    pub task_id: String,
    pub removed: bool,
    pub storage_warning: bool,
}

impl Output for TaskRmResult {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        if self.removed {
            format!(
                "Removed entry {} from {}{}",
                self.task_id,
                self.job_id,
                warning_suffix(self.storage_warning)
            )
        } else {
            format!("No entry {} found under {}", self.task_id, self.job_id)
        }
    }
}

/// Remove an entry. Removing an unknown id is a no-op, not an error.
pub fn task_rm(ws: &mut Workspace, job_id: &str, task_id: &str) -> Result<TaskRmResult> {
    let removed = ws.delete_task(job_id, task_id)?;
    Ok(TaskRmResult {
        job_id: job_id.to_string(),
        task_id: task_id.to_string(),
        removed,
        storage_warning: ws.storage_warning(),
    })
}

// === Summary & export ===

/// Result of `slg summary`.
#[derive(Debug, Serialize)]
pub struct SummaryResult {
    pub job_id: String,
    pub address: String,
    #[serde(flatten)]
    pub totals: JobTotals,
}

impl Output for SummaryResult {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        let totals = &self.totals;
        let mut out = format!(
            "Summary for {} ({} entries)\nTotal Est. Time: {}\n",
            self.address, totals.task_count, totals.total_time
        );
        if totals.materials.is_empty() {
            out.push_str("Material List: none recorded\n");
        } else {
            out.push_str(&format!(
                "Material List ({}): {}\n",
                totals.materials.len(),
                totals.materials.join(", ")
            ));
        }
        if totals.tools.is_empty() {
            out.push_str("Tools Needed: none recorded");
        } else {
            out.push_str(&format!(
                "Tools Needed ({}): {}",
                totals.tools.len(),
                totals.tools.join(", ")
            ));
        }
        out
    }
}

/// Compute the totals view for a job.
pub fn job_summary(ws: &Workspace, id: &str) -> Result<SummaryResult> {
    let job = ws
        .job(id)
        .ok_or_else(|| Error::NotFound(format!("no job with id {}", id)))?;
    Ok(SummaryResult {
        job_id: job.id.clone(),
        address: job.address.clone(),
        totals: summary::totals(job),
    })
}

/// Result of `slg export`.
#[derive(Debug, Serialize)]
pub struct ExportResult {
    pub job_id: String,
    pub exported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub task_count: usize,
}

impl Output for ExportResult {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        match &self.path {
            Some(path) => format!("Wrote estimate to {}", path.display()),
            None => "Nothing to export: job has no entries".to_string(),
        }
    }
}

/// Write the plain-text estimate for a job into `out_dir`.
///
/// A job with no entries exports nothing; that is a reported no-op, not an
/// error.
pub fn export(ws: &Workspace, id: &str, out_dir: &Path) -> Result<ExportResult> {
    let job = ws
        .job(id)
        .ok_or_else(|| Error::NotFound(format!("no job with id {}", id)))?;

    let generated_on = Local::now().format("%Y-%m-%d").to_string();
    let Some(doc) = summary::render_estimate(job, &generated_on) else {
        return Ok(ExportResult {
            job_id: job.id.clone(),
            exported: false,
            path: None,
            task_count: 0,
        });
    };

    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(summary::export_filename(&job.address));
    std::fs::write(&path, doc)?;

    Ok(ExportResult {
        job_id: job.id.clone(),
        exported: true,
        path: Some(path),
        task_count: job.tasks.len(),
    })
}
