//! In-memory store for tests and embedding.

use parking_lot::RwLock;
use provstore_core::{ProjectInfo, Record};

use crate::error::StoreError;
use crate::outcome::Outcome;
use crate::table::ProjectTable;
use crate::traits::Store;

/// A store that keeps everything in memory.
///
/// Supports every operation, including `clear`. `backup` and `remove` have
/// nothing to act on and report `Unsupported`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: RwLock<ProjectTable>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn describe(&self) -> String {
        "In-memory record store".to_string()
    }

    fn list_projects(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.table.read().list_projects())
    }

    fn create_project(
        &self,
        name: &str,
        long_name: &str,
        description: &str,
    ) -> Result<(), StoreError> {
        self.table
            .write()
            .create_project(name, long_name, description)
    }

    fn update_project_info(
        &self,
        name: &str,
        long_name: &str,
        description: &str,
    ) -> Result<(), StoreError> {
        self.table
            .write()
            .update_project_info(name, long_name, description)
    }

    fn has_project(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.table.read().has_project(name))
    }

    fn project_info(&self, name: &str) -> Result<ProjectInfo, StoreError> {
        Ok(self.table.read().project(name)?.info.clone())
    }

    fn save(&self, project: &str, record: &Record) -> Result<(), StoreError> {
        self.table.write().save(project, record)
    }

    fn get(&self, project: &str, label: &str) -> Result<Record, StoreError> {
        self.table.read().get(project, label)
    }

    fn list(&self, project: &str, tags: &[String]) -> Result<Vec<Record>, StoreError> {
        self.table.read().list(project, tags)
    }

    fn delete(&self, project: &str, label: &str) -> Result<Outcome<()>, StoreError> {
        self.table.write().delete(project, label)?;
        Ok(Outcome::Done(()))
    }

    fn delete_by_tag(&self, project: &str, tag: &str) -> Result<Outcome<usize>, StoreError> {
        Ok(Outcome::Done(self.table.write().delete_by_tag(project, tag)?))
    }

    fn most_recent(&self, project: &str) -> Result<String, StoreError> {
        self.table.read().most_recent(project)
    }

    fn clear(&self) -> Result<Outcome<()>, StoreError> {
        self.table.write().clear();
        Ok(Outcome::Done(()))
    }

    fn backup(&self) -> Result<Outcome<()>, StoreError> {
        Ok(Outcome::unsupported(
            "backup",
            "an in-memory record store has no persistent contents to back up",
        ))
    }

    fn remove(&self) -> Result<Outcome<()>, StoreError> {
        Ok(Outcome::unsupported(
            "remove",
            "an in-memory record store is removed when it is dropped",
        ))
    }

    fn as_dyn(&self) -> &dyn Store {
        self
    }
}
