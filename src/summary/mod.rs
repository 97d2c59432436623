//! Derived summary views over a job's task list.
//!
//! Everything here is recomputed on demand from the current tasks and never
//! persisted: the flattened materials list, the deduplicated tools list,
//! the best-effort time-estimate total, and the plain-text estimate
//! document.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::models::{Job, Task};

static HOUR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(\.\d+)?)\s*(h|hr|hour)").unwrap());
static MIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*(m|min)").unwrap());

/// Every material across every task, flattened and sorted. Duplicates are
/// kept: two tasks that both need "Paint" list it twice on the shopping
/// list.
pub fn all_materials(tasks: &[Task]) -> Vec<String> {
    let mut materials: Vec<String> = tasks
        .iter()
        .flat_map(|t| t.materials.iter().cloned())
        .collect();
    materials.sort();
    materials
}

/// Every tool across every task, deduplicated (case-sensitive) and sorted.
pub fn all_tools(tasks: &[Task]) -> Vec<String> {
    let tools: BTreeSet<String> = tasks
        .iter()
        .flat_map(|t| t.tools.iter().cloned())
        .collect();
    tools.into_iter().collect()
}

/// Parse a free-text time estimate into minutes.
///
/// Best-effort by design: an hour component (`2h`, `1.5 hr`, `2 hours`) and
/// a minute component (`30m`, `45 min`) each contribute independently; a
/// bare number is read as hours; anything else contributes 0. Malformed
/// input silently degrades to 0 rather than erroring.
pub fn parse_estimate(raw: &str) -> f64 {
    let text = raw.trim().to_lowercase();
    let mut minutes = 0.0;
    let mut matched = false;

    if let Some(caps) = HOUR_RE.captures(&text) {
        if let Ok(hours) = caps[1].parse::<f64>() {
            minutes += hours * 60.0;
            matched = true;
        }
    }
    if let Some(caps) = MIN_RE.captures(&text) {
        if let Ok(m) = caps[1].parse::<f64>() {
            minutes += m;
            matched = true;
        }
    }

    if !matched {
        if let Ok(hours) = text.parse::<f64>() {
            if hours.is_finite() {
                minutes = hours * 60.0;
            }
        }
    }

    minutes
}

/// Sum of every task's parsed time estimate, in minutes.
pub fn total_minutes(tasks: &[Task]) -> f64 {
    tasks.iter().map(|t| parse_estimate(&t.estimated_time)).sum()
}

/// Render minutes as a compact duration: `0h`, `45m`, `1h`, `1h 30m`.
///
/// Hours are floored; the minute remainder is rounded to the nearest
/// integer.
pub fn format_minutes(minutes: f64) -> String {
    if minutes == 0.0 {
        return "0h".to_string();
    }
    let h = (minutes / 60.0).floor() as i64;
    let m = (minutes % 60.0).round() as i64;

    if h > 0 && m > 0 {
        format!("{}h {}m", h, m)
    } else if h > 0 {
        format!("{}h", h)
    } else {
        format!("{}m", m)
    }
}

/// The job-totals view: counts, duration, and the master lists.
#[derive(Debug, Clone, Serialize)]
pub struct JobTotals {
    pub task_count: usize,
    pub total_minutes: f64,
    pub total_time: String,
    pub materials: Vec<String>,
    pub tools: Vec<String>,
}

/// Compute the totals view for a job.
pub fn totals(job: &Job) -> JobTotals {
    let minutes = total_minutes(&job.tasks);
    JobTotals {
        task_count: job.tasks.len(),
        total_minutes: minutes,
        total_time: format_minutes(minutes),
        materials: all_materials(&job.tasks),
        tools: all_tools(&job.tasks),
    }
}

const RULE_HEAVY: &str = "==================================================";
const RULE_LIGHT: &str = "--------------------------------------------------";

/// Render the plain-text estimate document for a job.
///
/// Returns `None` when the job has no tasks; generating an empty estimate
/// is a no-op. `generated_on` is the display date for the header.
pub fn render_estimate(job: &Job, generated_on: &str) -> Option<String> {
    if job.tasks.is_empty() {
        return None;
    }

    let mut content = String::new();
    content.push_str("JOBSITE ESTIMATE\n");
    content.push_str(&format!("Job: {}\n", job.address));
    if let Some(client) = &job.client_name {
        content.push_str(&format!("Client: {}\n", client));
    }
    content.push_str(&format!("Date: {}\n", generated_on));
    content.push_str(&format!("Total Items: {}\n", job.tasks.len()));
    content.push_str(&format!(
        "Total Est. Time: {}\n",
        format_minutes(total_minutes(&job.tasks))
    ));
    content.push_str(RULE_HEAVY);
    content.push_str("\n\n");

    for (index, task) in job.tasks.iter().enumerate() {
        content.push_str(&format!(
            "ENTRY #{}: {}\n",
            index + 1,
            task.title.to_uppercase()
        ));
        if !task.estimated_time.is_empty() {
            content.push_str(&format!("Time Est: {}\n", task.estimated_time));
        }
        content.push_str(RULE_LIGHT);
        content.push('\n');

        if !task.description.is_empty() {
            content.push_str(&format!("NOTES:\n{}\n\n", task.description));
        }

        if !task.materials.is_empty() {
            content.push_str("MATERIALS:\n");
            for m in &task.materials {
                content.push_str(&format!(" - {}\n", m));
            }
            content.push('\n');
        }

        if !task.tools.is_empty() {
            content.push_str("TOOLS:\n");
            for t in &task.tools {
                content.push_str(&format!(" - {}\n", t));
            }
            content.push('\n');
        }

        if !task.image_urls.is_empty() {
            content.push_str(&format!(
                "[Attached {} photo(s) to this item]\n",
                task.image_urls.len()
            ));
        }

        content.push('\n');
        content.push_str(RULE_HEAVY);
        content.push_str("\n\n");
    }

    content.push_str(" MATERIAL LIST:\n");
    for m in all_materials(&job.tasks) {
        content.push_str(&format!("[ ] {}\n", m));
    }

    content.push_str("\nREQUIRED TOOLS:\n");
    for t in all_tools(&job.tasks) {
        content.push_str(&format!("[ ] {}\n", t));
    }

    Some(content)
}

/// Suggested filename for an exported estimate: the job address with every
/// non-alphanumeric character replaced by `_`, prefixed `Estimate_`.
pub fn export_filename(address: &str) -> String {
    let safe: String = address
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("Estimate_{}.txt", safe)
}
