use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

/// Parameter values keyed by name. Iteration order is the key order.
pub type ParameterSet = BTreeMap<String, serde_json::Value>;

/// One captured execution of a computation.
///
/// The label identifies the record within its project. Once a record is
/// saved, only the outcome-like fields (`outcome`, `status`, `diff`,
/// `stdout_stderr`) are expected to change, by re-saving under the same label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub label: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(with = "crate::timestamp::serde_text")]
    pub timestamp: PrimitiveDateTime,
    /// Wall-clock duration in seconds, absent until the run finishes.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub executable: Option<Executable>,
    #[serde(default)]
    pub repository: Option<Repository>,
    #[serde(default)]
    pub main_file: Option<String>,
    /// Version-control revision of the code that ran.
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub parameters: ParameterSet,
    #[serde(default)]
    pub script_arguments: String,
    #[serde(default)]
    pub input_data: Vec<DataItem>,
    #[serde(default)]
    pub output_data: Vec<DataItem>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub outcome: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub stdout_stderr: String,
    #[serde(default)]
    pub diff: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub launch_mode: LaunchMode,
}

impl Record {
    /// A record with the given label and timestamp and every other field empty.
    pub fn new(label: impl Into<String>, timestamp: PrimitiveDateTime) -> Self {
        Record {
            label: label.into(),
            reason: String::new(),
            tags: BTreeSet::new(),
            timestamp,
            duration: None,
            executable: None,
            repository: None,
            main_file: None,
            version: None,
            parameters: ParameterSet::new(),
            script_arguments: String::new(),
            input_data: Vec::new(),
            output_data: Vec::new(),
            dependencies: Vec::new(),
            platform: Platform::default(),
            outcome: String::new(),
            status: String::new(),
            stdout_stderr: String::new(),
            diff: String::new(),
            user: String::new(),
            launch_mode: LaunchMode::default(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// True when `tags` is empty or the record carries at least one of them.
    pub fn matches_tags(&self, tags: &[String]) -> bool {
        tags.is_empty() || tags.iter().any(|t| self.tags.contains(t))
    }
}

/// A file read or written by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataItem {
    /// Path relative to `store`.
    pub path: String,
    /// Content digest (hex SHA-1 in practice, opaque here).
    pub digest: String,
    /// Root location of the datastore holding the file.
    #[serde(default)]
    pub store: String,
}

impl DataItem {
    pub fn new(path: impl Into<String>, digest: impl Into<String>, store: impl Into<String>) -> Self {
        DataItem {
            path: path.into(),
            digest: digest.into(),
            store: store.into(),
        }
    }

    /// Location of the file on the local filesystem.
    pub fn local_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.store).join(&self.path)
    }
}

/// A software dependency captured at run time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version: String,
    pub digest: String,
}

/// The program that executed the run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Executable {
    pub name: String,
    pub path: String,
    pub version: String,
    #[serde(default)]
    pub options: String,
}

/// Pointer to the version-control repository holding the code.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Repository {
    /// Kind of repository, e.g. `git` or `mercurial`.
    pub kind: String,
    pub url: String,
    #[serde(default)]
    pub upstream: Option<String>,
}

/// Execution-environment descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Platform {
    pub system_name: String,
    pub release: String,
    pub version: String,
    pub machine: String,
    pub processor: String,
    pub network_name: String,
    pub ip_addr: String,
    pub architecture_bits: String,
    pub architecture_linkage: String,
}

/// How the run was launched (serial, distributed, ...).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LaunchMode {
    pub kind: String,
    #[serde(default)]
    pub parameters: ParameterSet,
}

impl LaunchMode {
    pub fn serial() -> Self {
        LaunchMode {
            kind: "serial".to_string(),
            parameters: ParameterSet::new(),
        }
    }
}
