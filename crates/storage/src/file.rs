//! Local store serialized to a single JSON document.

use std::fs;
use std::path::{Path, PathBuf};

use provstore_core::{ProjectInfo, Record};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::outcome::Outcome;
use crate::table::ProjectTable;
use crate::traits::Store;

/// A store kept in one JSON file.
///
/// The file is read at the start of every operation and, for mutations,
/// rewritten before it returns (write to a sibling temp file, then rename).
/// A missing file reads as an empty store; it is created on first write.
/// There is no file locking: concurrent writers race and the last rename
/// wins.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Open (without touching the disk) the store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<ProjectTable, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(ProjectTable::default()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ProjectTable::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, table: &ProjectTable) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.sibling("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(table)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "record store written");
        Ok(())
    }

    fn update<T>(
        &self,
        f: impl FnOnce(&mut ProjectTable) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut table = self.load()?;
        let value = f(&mut table)?;
        self.store(&table)?;
        Ok(value)
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}", suffix));
        self.path.with_file_name(name)
    }
}

impl Store for JsonFileStore {
    fn describe(&self) -> String {
        format!("Record store using JSON file {}", self.path.display())
    }

    fn list_projects(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.load()?.list_projects())
    }

    fn create_project(
        &self,
        name: &str,
        long_name: &str,
        description: &str,
    ) -> Result<(), StoreError> {
        self.update(|t| t.create_project(name, long_name, description))
    }

    fn update_project_info(
        &self,
        name: &str,
        long_name: &str,
        description: &str,
    ) -> Result<(), StoreError> {
        self.update(|t| t.update_project_info(name, long_name, description))
    }

    fn has_project(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.load()?.has_project(name))
    }

    fn project_info(&self, name: &str) -> Result<ProjectInfo, StoreError> {
        Ok(self.load()?.project(name)?.info.clone())
    }

    fn save(&self, project: &str, record: &Record) -> Result<(), StoreError> {
        self.update(|t| t.save(project, record))
    }

    fn get(&self, project: &str, label: &str) -> Result<Record, StoreError> {
        self.load()?.get(project, label)
    }

    fn list(&self, project: &str, tags: &[String]) -> Result<Vec<Record>, StoreError> {
        self.load()?.list(project, tags)
    }

    fn delete(&self, project: &str, label: &str) -> Result<Outcome<()>, StoreError> {
        self.update(|t| t.delete(project, label))?;
        Ok(Outcome::Done(()))
    }

    fn delete_by_tag(&self, project: &str, tag: &str) -> Result<Outcome<usize>, StoreError> {
        Ok(Outcome::Done(self.update(|t| t.delete_by_tag(project, tag))?))
    }

    fn most_recent(&self, project: &str) -> Result<String, StoreError> {
        self.load()?.most_recent(project)
    }

    fn clear(&self) -> Result<Outcome<()>, StoreError> {
        self.update(|t| {
            t.clear();
            Ok(())
        })?;
        Ok(Outcome::Done(()))
    }

    /// Copy the file to `<path>.<unix-seconds>.bak`.
    fn backup(&self) -> Result<Outcome<()>, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::Config(format!(
                "nothing to back up: {} does not exist",
                self.path.display()
            )));
        }
        let stamp = time::OffsetDateTime::now_utc().unix_timestamp();
        let target = self.sibling(&format!("{}.bak", stamp));
        fs::copy(&self.path, &target)?;
        info!(backup = %target.display(), "record store backed up");
        Ok(Outcome::Done(()))
    }

    fn remove(&self) -> Result<Outcome<()>, StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(Outcome::Done(())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Outcome::Done(())),
            Err(e) => Err(e.into()),
        }
    }

    fn as_dyn(&self) -> &dyn Store {
        self
    }
}
