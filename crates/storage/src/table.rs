//! In-process model of a whole store, shared by the local backends.

use std::collections::BTreeMap;

use provstore_core::{is_valid_project_name, ProjectInfo, Record};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Every project and record of a local store.
///
/// This is also the on-disk document of [`JsonFileStore`](crate::JsonFileStore).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct ProjectTable {
    #[serde(default)]
    pub projects: BTreeMap<String, StoredProject>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoredProject {
    #[serde(default)]
    pub info: ProjectInfo,
    #[serde(default)]
    pub records: BTreeMap<String, Record>,
}

impl StoredProject {
    fn new(name: &str, long_name: &str, description: &str) -> Self {
        let display = if long_name.is_empty() { name } else { long_name };
        StoredProject {
            info: ProjectInfo::new(display, description),
            records: BTreeMap::new(),
        }
    }
}

impl ProjectTable {
    pub fn list_projects(&self) -> Vec<String> {
        self.projects.keys().cloned().collect()
    }

    pub fn has_project(&self, name: &str) -> bool {
        self.projects.contains_key(name)
    }

    pub fn create_project(
        &mut self,
        name: &str,
        long_name: &str,
        description: &str,
    ) -> Result<(), StoreError> {
        check_name(name)?;
        if self.projects.contains_key(name) {
            return Err(StoreError::Config(format!(
                "project '{}' already exists",
                name
            )));
        }
        self.projects
            .insert(name.to_string(), StoredProject::new(name, long_name, description));
        Ok(())
    }

    pub fn update_project_info(
        &mut self,
        name: &str,
        long_name: &str,
        description: &str,
    ) -> Result<(), StoreError> {
        let project = self.project_mut(name)?;
        project.info = StoredProject::new(name, long_name, description).info;
        Ok(())
    }

    pub fn project(&self, name: &str) -> Result<&StoredProject, StoreError> {
        self.projects
            .get(name)
            .ok_or_else(|| StoreError::ProjectNotFound {
                project: name.to_string(),
            })
    }

    fn project_mut(&mut self, name: &str) -> Result<&mut StoredProject, StoreError> {
        self.projects
            .get_mut(name)
            .ok_or_else(|| StoreError::ProjectNotFound {
                project: name.to_string(),
            })
    }

    /// Insert or overwrite a record, creating the project on first use.
    pub fn save(&mut self, project: &str, record: &Record) -> Result<(), StoreError> {
        check_name(project)?;
        if record.label.is_empty() {
            return Err(StoreError::Config("record label must not be empty".into()));
        }
        self.projects
            .entry(project.to_string())
            .or_insert_with(|| StoredProject::new(project, "", ""))
            .records
            .insert(record.label.clone(), record.clone());
        Ok(())
    }

    pub fn get(&self, project: &str, label: &str) -> Result<Record, StoreError> {
        self.project(project)?
            .records
            .get(label)
            .cloned()
            .ok_or_else(|| StoreError::not_found(project, label))
    }

    pub fn list(&self, project: &str, tags: &[String]) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .project(project)?
            .records
            .values()
            .filter(|r| r.matches_tags(tags))
            .cloned()
            .collect())
    }

    pub fn delete(&mut self, project: &str, label: &str) -> Result<(), StoreError> {
        self.project_mut(project)?
            .records
            .remove(label)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(project, label))
    }

    pub fn delete_by_tag(&mut self, project: &str, tag: &str) -> Result<usize, StoreError> {
        let records = &mut self.project_mut(project)?.records;
        let before = records.len();
        records.retain(|_, r| !r.has_tag(tag));
        Ok(before - records.len())
    }

    pub fn most_recent(&self, project: &str) -> Result<String, StoreError> {
        self.project(project)?
            .records
            .values()
            .max_by_key(|r| r.timestamp)
            .map(|r| r.label.clone())
            .ok_or_else(|| StoreError::EmptyProject {
                project: project.to_string(),
            })
    }

    pub fn clear(&mut self) {
        self.projects.clear();
    }
}

fn check_name(name: &str) -> Result<(), StoreError> {
    if is_valid_project_name(name) {
        Ok(())
    } else {
        Err(StoreError::Config(format!("invalid project name '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn auto_vivified_project_uses_name_as_display_name() {
        let mut t = ProjectTable::default();
        t.save("p", &Record::new("a", datetime!(2024-01-01 00:00:00)))
            .unwrap();
        assert_eq!(t.project("p").unwrap().info, ProjectInfo::new("p", ""));
    }

    #[test]
    fn most_recent_uses_timestamp_not_label_order() {
        let mut t = ProjectTable::default();
        t.save("p", &Record::new("z-old", datetime!(2024-01-01 00:00:00)))
            .unwrap();
        t.save("p", &Record::new("a-new", datetime!(2024-06-01 00:00:00)))
            .unwrap();
        assert_eq!(t.most_recent("p").unwrap(), "a-new");
    }

    #[test]
    fn delete_by_tag_counts_removed() {
        let mut t = ProjectTable::default();
        let ts = datetime!(2024-01-01 00:00:00);
        t.save("p", &Record::new("a", ts).with_tag("x")).unwrap();
        t.save("p", &Record::new("b", ts).with_tag("x")).unwrap();
        t.save("p", &Record::new("c", ts)).unwrap();
        assert_eq!(t.delete_by_tag("p", "x").unwrap(), 2);
        assert_eq!(t.list("p", &[]).unwrap().len(), 1);
    }

    #[test]
    fn rejects_invalid_project_name() {
        let mut t = ProjectTable::default();
        let err = t
            .save("a/b", &Record::new("a", datetime!(2024-01-01 00:00:00)))
            .unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }
}
