use provstore_core::{ProjectInfo, Record};

use crate::error::StoreError;
use crate::outcome::Outcome;
use crate::sync::{self, SyncReport};

/// The uniform contract every provenance backend implements.
///
/// A `Store` is a gateway, not a cache: each call fetches from or pushes to
/// the backend, and returned records are detached copies. Nothing here
/// coordinates concurrent callers; two writers racing on the same new project
/// or label are serialized (or not) by the backend itself.
///
/// ## Projects
///
/// A project is created implicitly by the first [`save`](Store::save) into
/// it. [`create_project`](Store::create_project) exists for callers that want
/// to set the long name and description up front.
///
/// ## Refused operations
///
/// `delete`, `delete_by_tag`, `clear`, `backup` and `remove` return
/// [`Outcome::Unsupported`] on backends whose service policy forbids them.
/// That is not an error.
pub trait Store: Send + Sync {
    /// Human-readable description of the backend and its target.
    fn describe(&self) -> String;

    // ── Projects ─────────────────────────────────────────────────────────────

    /// Names of every project in the store.
    fn list_projects(&self) -> Result<Vec<String>, StoreError>;

    /// Create an empty project.
    fn create_project(
        &self,
        name: &str,
        long_name: &str,
        description: &str,
    ) -> Result<(), StoreError>;

    /// Replace a project's long name and description.
    fn update_project_info(
        &self,
        name: &str,
        long_name: &str,
        description: &str,
    ) -> Result<(), StoreError>;

    /// Whether the project exists. Agrees with [`list_projects`](Store::list_projects).
    fn has_project(&self, name: &str) -> Result<bool, StoreError>;

    /// Long name and description of a project.
    fn project_info(&self, name: &str) -> Result<ProjectInfo, StoreError>;

    // ── Records ──────────────────────────────────────────────────────────────

    /// Save a record, overwriting any record with the same label.
    fn save(&self, project: &str, record: &Record) -> Result<(), StoreError>;

    /// Fetch one record. Returns [`StoreError::NotFound`] if the label is absent.
    fn get(&self, project: &str, label: &str) -> Result<Record, StoreError>;

    /// All records in the project, or those carrying any of `tags`.
    fn list(&self, project: &str, tags: &[String]) -> Result<Vec<Record>, StoreError>;

    /// Labels of the records [`list`](Store::list) would return.
    fn labels(&self, project: &str, tags: &[String]) -> Result<Vec<String>, StoreError> {
        Ok(self
            .list(project, tags)?
            .into_iter()
            .map(|r| r.label)
            .collect())
    }

    /// Delete one record.
    fn delete(&self, project: &str, label: &str) -> Result<Outcome<()>, StoreError>;

    /// Delete every record carrying `tag`, returning how many went.
    fn delete_by_tag(&self, project: &str, tag: &str) -> Result<Outcome<usize>, StoreError>;

    /// Label of the record with the latest timestamp.
    fn most_recent(&self, project: &str) -> Result<String, StoreError>;

    /// Pull every record of `project` from `other` into this store.
    ///
    /// One-directional and last-writer-wins; see [`sync::sync_project`].
    fn sync(&self, other: &dyn Store, project: &str) -> Result<SyncReport, StoreError> {
        sync::sync_project(other, self.as_dyn(), project)
    }

    /// JSON array of every record in the project.
    fn export(&self, project: &str) -> Result<String, StoreError> {
        let records = self.list(project, &[])?;
        Ok(serde_json::to_string_pretty(&records)?)
    }

    // ── Whole-store maintenance ──────────────────────────────────────────────

    /// Delete every project and record.
    fn clear(&self) -> Result<Outcome<()>, StoreError>;

    /// Copy the store's contents somewhere safe.
    fn backup(&self) -> Result<Outcome<()>, StoreError>;

    /// Delete the store itself.
    fn remove(&self) -> Result<Outcome<()>, StoreError>;

    /// Upcast helper so default methods can hand `self` to the sync engine.
    fn as_dyn(&self) -> &dyn Store;
}
