//! One-directional merge of a project's records from one store into another.
//!
//! The merge only uses `has_project`, `create_project`, `labels`, `get` and
//! `save`, so any pair of backends can be synchronized. It is last-writer-wins
//! per label: no conflict detection, no timestamp comparison. It is not
//! atomic; a failure partway through leaves the target partially updated and
//! the caller can simply run it again, since re-saving a label overwrites.

use tracing::{debug, info};

use crate::error::StoreError;
use crate::traits::Store;

/// What a sync run copied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub project: String,
    /// Whether the project had to be created on the target.
    pub created_project: bool,
    /// Labels saved to the target, in source order.
    pub copied: Vec<String>,
}

/// Ensure `target` holds every record `source` has for `project`.
pub fn sync_project(
    source: &dyn Store,
    target: &dyn Store,
    project: &str,
) -> Result<SyncReport, StoreError> {
    let created_project = ensure_project(target, project)?;

    let labels = source.labels(project, &[])?;
    let mut copied = Vec::with_capacity(labels.len());
    for label in labels {
        debug!(project, label = %label, "syncing record");
        let record = source.get(project, &label)?;
        target.save(project, &record)?;
        copied.push(label);
    }

    info!(
        project,
        records = copied.len(),
        source = %source.describe(),
        target = %target.describe(),
        "sync complete"
    );

    Ok(SyncReport {
        project: project.to_string(),
        created_project,
        copied,
    })
}

/// Sync every project listed by `source`.
pub fn sync_all(source: &dyn Store, target: &dyn Store) -> Result<Vec<SyncReport>, StoreError> {
    source
        .list_projects()?
        .iter()
        .map(|project| sync_project(source, target, project))
        .collect()
}

/// Create `project` on `store` if it is missing. Returns whether it was created.
///
/// Check-then-create is not atomic; a concurrent creator can win the race and
/// the backend decides what the losing create does.
pub fn ensure_project(store: &dyn Store, project: &str) -> Result<bool, StoreError> {
    if store.has_project(project)? {
        return Ok(false);
    }
    info!(project, store = %store.describe(), "creating project");
    store.create_project(project, "", "")?;
    Ok(true)
}
