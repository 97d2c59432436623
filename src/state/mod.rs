//! The in-memory workspace: the job collection, the active-job selection,
//! and the sticky storage warning, backed by a key-value store.
//!
//! Every mutating operation persists the full job collection synchronously.
//! A write rejected for capacity leaves the in-memory mutation in place and
//! raises the warning flag; the flag clears on the next successful write.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::models::migrate::{self, CURRENT_SCHEMA_VERSION};
use crate::models::{Job, StateDocument, Task, generate_id, split_list};
use crate::store::{JOBS_KEY, Store};
use crate::{Error, Result};

/// Input boundary for task creation. Materials and tools arrive as the raw
/// comma-delimited strings the user typed.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub estimated_time: String,
    pub description: String,
    pub materials_raw: String,
    pub tools_raw: String,
    pub image_urls: Vec<String>,
}

/// Serialization view of the current state, borrowed to avoid cloning the
/// job collection on every save.
#[derive(Serialize)]
struct DocumentRef<'a> {
    schema_version: u32,
    jobs: &'a [Job],
}

/// The owned application state container.
pub struct Workspace {
    jobs: Vec<Job>,
    active_job: Option<String>,
    storage_warning: bool,
    store: Box<dyn Store>,
}

impl Workspace {
    /// Load the workspace from the store.
    ///
    /// An absent document is the first-run state, not an error. A document
    /// that fails to parse or migrate degrades to an empty collection with
    /// a stderr warning; it never blocks the user.
    pub fn load(store: Box<dyn Store>) -> Self {
        let jobs = match Self::read_jobs(store.as_ref()) {
            Ok(jobs) => jobs,
            Err(e) => {
                eprintln!(
                    "Warning: failed to load saved jobs from {} ({}); starting with an empty log",
                    store.location(),
                    e
                );
                Vec::new()
            }
        };

        Self {
            jobs,
            active_job: None,
            storage_warning: false,
            store,
        }
    }

    fn read_jobs(store: &dyn Store) -> Result<Vec<Job>> {
        let Some(raw) = store.get(JOBS_KEY)? else {
            return Ok(Vec::new());
        };
        let value: Value = serde_json::from_str(&raw)?;
        let migrated = migrate::migrate_document(value)?;
        let doc: StateDocument = serde_json::from_value(migrated)?;
        Ok(doc.jobs)
    }

    /// Persist the full job collection as one whole-document overwrite.
    ///
    /// A capacity rejection is absorbed: the mutation stands and the
    /// warning flag is raised until a later write succeeds. Any other
    /// store failure propagates.
    pub fn save(&mut self) -> Result<()> {
        let doc = DocumentRef {
            schema_version: CURRENT_SCHEMA_VERSION,
            jobs: &self.jobs,
        };
        let raw = serde_json::to_string(&doc)?;
        match self.store.set(JOBS_KEY, &raw) {
            Ok(()) => {
                self.storage_warning = false;
                Ok(())
            }
            Err(Error::StoreFull(_)) => {
                self.storage_warning = true;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Create a job and prepend it to the collection (newest-first).
    ///
    /// A blank address is rejected at the boundary: nothing is added,
    /// nothing is persisted, and `None` is returned.
    pub fn create_job(&mut self, address: &str, client_name: Option<&str>) -> Result<Option<Job>> {
        if address.trim().is_empty() {
            return Ok(None);
        }

        let client_name = client_name
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        let id = self.fresh_id("job", address, |ws, id| ws.jobs.iter().any(|j| j.id == id));
        let job = Job::new(id, address.to_string(), client_name);
        self.jobs.insert(0, job.clone());
        self.save()?;
        Ok(Some(job))
    }

    /// Remove the job with `id`. No-op when absent. Returns whether a job
    /// was removed.
    ///
    /// Confirmation and clearing the active selection are the caller's
    /// concern; see `clear_selection_if`.
    pub fn delete_job(&mut self, id: &str) -> Result<bool> {
        let before = self.jobs.len();
        self.jobs.retain(|j| j.id != id);
        if self.jobs.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Create a task under the job with `job_id`, newest-first.
    ///
    /// A blank title or an unresolved job id is rejected at the boundary:
    /// no partial record is created and `None` is returned.
    pub fn create_task(&mut self, job_id: &str, input: NewTask) -> Result<Option<Task>> {
        if input.title.trim().is_empty() {
            return Ok(None);
        }
        if !self.jobs.iter().any(|j| j.id == job_id) {
            return Ok(None);
        }

        let id = self.fresh_id("tsk", &input.title, |ws, id| {
            ws.jobs.iter().flat_map(|j| &j.tasks).any(|t| t.id == id)
        });

        let mut task = Task::new(id, input.title);
        task.estimated_time = input.estimated_time;
        task.description = input.description;
        task.materials = split_list(&input.materials_raw);
        task.tools = split_list(&input.tools_raw);
        task.image_urls = input.image_urls;

        let Some(job) = self.jobs.iter_mut().find(|j| j.id == job_id) else {
            return Ok(None);
        };
        job.tasks.insert(0, task.clone());
        job.updated_at = Utc::now();

        self.save()?;
        Ok(Some(task))
    }

    /// Remove the task with `task_id` from the job with `job_id`. No-op
    /// when either is absent. Returns whether a task was removed.
    pub fn delete_task(&mut self, job_id: &str, task_id: &str) -> Result<bool> {
        let Some(job) = self.jobs.iter_mut().find(|j| j.id == job_id) else {
            return Ok(false);
        };

        let before = job.tasks.len();
        job.tasks.retain(|t| t.id != task_id);
        if job.tasks.len() == before {
            return Ok(false);
        }
        job.updated_at = Utc::now();

        self.save()?;
        Ok(true)
    }

    /// All jobs, newest-first.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Find a job by id.
    pub fn job(&self, id: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    /// Select the active job (the job-detail view). Returns false when the
    /// id does not resolve.
    pub fn select_job(&mut self, id: &str) -> bool {
        if self.jobs.iter().any(|j| j.id == id) {
            self.active_job = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// The currently selected job, if any.
    pub fn active_job(&self) -> Option<&Job> {
        let id = self.active_job.as_deref()?;
        self.job(id)
    }

    /// Clear the active selection when it points at `id`. Callers invoke
    /// this after deleting a job.
    pub fn clear_selection_if(&mut self, id: &str) {
        if self.active_job.as_deref() == Some(id) {
            self.active_job = None;
        }
    }

    /// Whether the last write was rejected for capacity and the data on
    /// disk is stale. Sticks until a write succeeds.
    pub fn storage_warning(&self) -> bool {
        self.storage_warning
    }

    /// Generate an id that does not collide with any existing one.
    fn fresh_id(&self, prefix: &str, seed: &str, exists: fn(&Self, &str) -> bool) -> String {
        loop {
            let id = generate_id(prefix, seed);
            if !exists(self, &id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;
    use crate::test_utils::TestEnv;

    fn empty_workspace() -> Workspace {
        TestEnv::mem_workspace(None)
    }

    #[test]
    fn test_create_job_rejects_blank_address() {
        let mut ws = empty_workspace();
        assert!(ws.create_job("", None).unwrap().is_none());
        assert!(ws.create_job("   ", None).unwrap().is_none());
        assert!(ws.jobs().is_empty());
    }

    #[test]
    fn test_create_job_prepends() {
        let mut ws = empty_workspace();
        let first = ws.create_job("42 Wallaby Way", Some("P. Sherman")).unwrap().unwrap();
        assert!(!first.id.is_empty());
        assert!(first.tasks.is_empty());

        let second = ws.create_job("10 Downing St", None).unwrap().unwrap();
        let ids: Vec<&str> = ws.jobs().iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_create_job_blank_client_becomes_none() {
        let mut ws = empty_workspace();
        let job = ws.create_job("42 Wallaby Way", Some("  ")).unwrap().unwrap();
        assert_eq!(job.client_name, None);
    }

    #[test]
    fn test_delete_job_absent_is_noop() {
        let mut ws = empty_workspace();
        ws.create_job("42 Wallaby Way", None).unwrap();
        assert!(!ws.delete_job("job-ffffffff").unwrap());
        assert_eq!(ws.jobs().len(), 1);
    }

    #[test]
    fn test_delete_job_removes() {
        let mut ws = empty_workspace();
        let job = ws.create_job("42 Wallaby Way", None).unwrap().unwrap();
        assert!(ws.delete_job(&job.id).unwrap());
        assert!(ws.jobs().is_empty());
    }

    #[test]
    fn test_create_task_rejects_blank_title() {
        let mut ws = empty_workspace();
        let job = ws.create_job("42 Wallaby Way", None).unwrap().unwrap();
        let input = NewTask {
            title: "   ".to_string(),
            ..NewTask::default()
        };
        assert!(ws.create_task(&job.id, input).unwrap().is_none());
        assert!(ws.job(&job.id).unwrap().tasks.is_empty());
    }

    #[test]
    fn test_create_task_rejects_unknown_job() {
        let mut ws = empty_workspace();
        let input = NewTask {
            title: "Paint".to_string(),
            ..NewTask::default()
        };
        assert!(ws.create_task("job-ffffffff", input).unwrap().is_none());
    }

    #[test]
    fn test_create_task_splits_materials_and_tools() {
        let mut ws = empty_workspace();
        let job = ws.create_job("42 Wallaby Way", None).unwrap().unwrap();
        let input = NewTask {
            title: "Paint living room".to_string(),
            materials_raw: "Paint, Tape, ,Primer".to_string(),
            tools_raw: "Brush,Roller".to_string(),
            ..NewTask::default()
        };
        let task = ws.create_task(&job.id, input).unwrap().unwrap();
        assert_eq!(task.materials, vec!["Paint", "Tape", "Primer"]);
        assert_eq!(task.tools, vec!["Brush", "Roller"]);
        assert!(!task.is_completed);
    }

    #[test]
    fn test_create_task_prepends_and_touches_job() {
        let mut ws = empty_workspace();
        let job = ws.create_job("42 Wallaby Way", None).unwrap().unwrap();
        let created_updated_at = job.updated_at;

        let first = ws
            .create_task(&job.id, NewTask { title: "Demo walls".to_string(), ..NewTask::default() })
            .unwrap()
            .unwrap();
        let second = ws
            .create_task(&job.id, NewTask { title: "Paint".to_string(), ..NewTask::default() })
            .unwrap()
            .unwrap();

        let job = ws.job(&job.id).unwrap();
        let ids: Vec<&str> = job.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
        assert!(job.updated_at >= created_updated_at);
    }

    #[test]
    fn test_delete_task_absent_is_noop() {
        let mut ws = empty_workspace();
        let job = ws.create_job("42 Wallaby Way", None).unwrap().unwrap();
        ws.create_task(&job.id, NewTask { title: "Paint".to_string(), ..NewTask::default() })
            .unwrap();

        assert!(!ws.delete_task(&job.id, "tsk-ffffffff").unwrap());
        assert!(!ws.delete_task("job-ffffffff", "tsk-ffffffff").unwrap());
        assert_eq!(ws.job(&job.id).unwrap().tasks.len(), 1);
    }

    #[test]
    fn test_delete_task_removes() {
        let mut ws = empty_workspace();
        let job = ws.create_job("42 Wallaby Way", None).unwrap().unwrap();
        let task = ws
            .create_task(&job.id, NewTask { title: "Paint".to_string(), ..NewTask::default() })
            .unwrap()
            .unwrap();

        assert!(ws.delete_task(&job.id, &task.id).unwrap());
        assert!(ws.job(&job.id).unwrap().tasks.is_empty());
    }

    #[test]
    fn test_quota_failure_keeps_mutation_and_sets_warning() {
        // Capacity too small for even one job: the write is rejected but
        // the in-memory collection keeps the new job.
        let mut ws = TestEnv::mem_workspace(Some(16));
        let job = ws.create_job("42 Wallaby Way", None).unwrap().unwrap();

        assert!(ws.storage_warning());
        assert_eq!(ws.jobs().len(), 1);
        assert_eq!(ws.jobs()[0].id, job.id);
    }

    #[test]
    fn test_warning_clears_on_next_successful_write() {
        // Room for an empty collection but not for a job with a long
        // address: creating trips the warning, deleting clears it.
        let mut ws = TestEnv::mem_workspace(Some(120));
        let job = ws
            .create_job(&"Very Long Address ".repeat(20), None)
            .unwrap()
            .unwrap();
        assert!(ws.storage_warning());

        ws.delete_job(&job.id).unwrap();
        assert!(!ws.storage_warning());
    }

    #[test]
    fn test_load_malformed_document_degrades_to_empty() {
        let mut store = MemStore::new(None);
        store.set(JOBS_KEY, "{not json").unwrap();
        let ws = Workspace::load(Box::new(store));
        assert!(ws.jobs().is_empty());
    }

    #[test]
    fn test_load_legacy_document_migrates_images() {
        let mut store = MemStore::new(None);
        store
            .set(
                JOBS_KEY,
                r#"[{
                    "id": "job-00000001",
                    "address": "42 Wallaby Way",
                    "tasks": [{
                        "id": "tsk-00000001",
                        "title": "Paint",
                        "image_url": "data:image/jpeg;base64,abc",
                        "created_at": "2026-01-01T00:00:00Z"
                    }],
                    "created_at": "2026-01-01T00:00:00Z",
                    "updated_at": "2026-01-01T00:00:00Z"
                }]"#,
            )
            .unwrap();

        let ws = Workspace::load(Box::new(store));
        let task = &ws.jobs()[0].tasks[0];
        assert_eq!(task.image_urls, vec!["data:image/jpeg;base64,abc"]);
    }

    #[test]
    fn test_persistence_roundtrip_through_file_store() {
        let env = TestEnv::new();

        let job_id = {
            let mut ws = env.file_workspace();
            let job = ws.create_job("42 Wallaby Way", Some("P. Sherman")).unwrap().unwrap();
            ws.create_task(
                &job.id,
                NewTask {
                    title: "Paint".to_string(),
                    materials_raw: "Paint, Tape".to_string(),
                    ..NewTask::default()
                },
            )
            .unwrap();
            job.id
        };

        let ws = env.file_workspace();
        let job = ws.job(&job_id).unwrap();
        assert_eq!(job.address, "42 Wallaby Way");
        assert_eq!(job.tasks.len(), 1);
        assert_eq!(job.tasks[0].materials, vec!["Paint", "Tape"]);
    }

    #[test]
    fn test_selection_follows_job_lifecycle() {
        let mut ws = empty_workspace();
        let job = ws.create_job("42 Wallaby Way", None).unwrap().unwrap();

        assert!(!ws.select_job("job-ffffffff"));
        assert!(ws.select_job(&job.id));
        assert_eq!(ws.active_job().unwrap().id, job.id);

        ws.delete_job(&job.id).unwrap();
        ws.clear_selection_if(&job.id);
        assert!(ws.active_job().is_none());
    }
}
