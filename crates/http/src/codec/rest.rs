//! JSON documents of the versioned REST dialect.

use provstore_core::{
    DataItem, Dependency, Executable, ParameterSet, Platform, ProjectInfo, Record,
};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use super::{CodecError, WireLaunchMode, WireRepository};

/// Protocol version carried in every vendor media type.
pub const API_VERSION: u32 = 3;

/// `application/vnd.provstore.<resource>-v3+json`
pub fn media_type(resource: &str) -> String {
    format!("application/vnd.provstore.{}-v{}+json", resource, API_VERSION)
}

/// `Accept` value: the vendor type first, then plain JSON.
pub fn accept(resource: &str) -> String {
    format!("{}, application/json", media_type(resource))
}

#[derive(Debug, Deserialize)]
struct ProjectListEntry {
    id: String,
}

/// A project as served by `GET /{project}/`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ProjectDocument {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// URLs of the project's records.
    #[serde(default)]
    pub records: Vec<String>,
}

impl ProjectDocument {
    pub fn info(&self) -> ProjectInfo {
        ProjectInfo::new(self.name.clone(), self.description.clone())
    }
}

#[derive(Debug, Serialize)]
struct ProjectInfoBody<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
struct WireParameters {
    #[serde(rename = "type", default = "dict")]
    kind: String,
    #[serde(default)]
    content: ParameterSet,
}

fn dict() -> String {
    "dict".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireRecord {
    label: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(with = "provstore_core::timestamp::serde_text")]
    timestamp: PrimitiveDateTime,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    executable: Option<Executable>,
    #[serde(default)]
    repository: Option<WireRepository>,
    #[serde(default)]
    main_file: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    parameters: WireParameters,
    #[serde(default)]
    script_arguments: String,
    #[serde(default)]
    input_data: Vec<DataItem>,
    #[serde(default)]
    output_data: Vec<DataItem>,
    #[serde(default)]
    dependencies: Vec<Dependency>,
    #[serde(default)]
    platforms: Vec<Platform>,
    #[serde(default)]
    outcome: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    stdout_stderr: String,
    #[serde(default)]
    diff: String,
    #[serde(default)]
    user: String,
    #[serde(default)]
    launch_mode: WireLaunchMode,
}

/// Project names from the `GET /` listing.
pub fn decode_project_list(body: &[u8]) -> Result<Vec<String>, CodecError> {
    let entries: Vec<ProjectListEntry> = serde_json::from_slice(body)?;
    Ok(entries.into_iter().map(|e| e.id).collect())
}

pub fn decode_project(body: &[u8]) -> Result<ProjectDocument, CodecError> {
    Ok(serde_json::from_slice(body)?)
}

/// Body of the project PUT; the long name travels as `name`.
pub fn encode_project_info(long_name: &str, description: &str) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(&ProjectInfoBody {
        name: long_name,
        description,
    })?)
}

pub fn encode_record(record: &Record) -> Result<Vec<u8>, CodecError> {
    let wire = WireRecord {
        label: record.label.clone(),
        reason: record.reason.clone(),
        tags: record.tags.iter().cloned().collect(),
        timestamp: record.timestamp,
        duration: record.duration,
        executable: record.executable.clone(),
        repository: record.repository.as_ref().map(WireRepository::from),
        main_file: record.main_file.clone(),
        version: record.version.clone(),
        parameters: WireParameters {
            kind: dict(),
            content: record.parameters.clone(),
        },
        script_arguments: record.script_arguments.clone(),
        input_data: record.input_data.clone(),
        output_data: record.output_data.clone(),
        dependencies: record.dependencies.clone(),
        platforms: vec![record.platform.clone()],
        outcome: record.outcome.clone(),
        status: record.status.clone(),
        stdout_stderr: record.stdout_stderr.clone(),
        diff: record.diff.clone(),
        user: record.user.clone(),
        launch_mode: WireLaunchMode::from(&record.launch_mode),
    };
    Ok(serde_json::to_vec(&wire)?)
}

pub fn decode_record(body: &[u8]) -> Result<Record, CodecError> {
    let wire: WireRecord = serde_json::from_slice(body)?;
    if wire.label.is_empty() {
        return Err(CodecError::shape("record without a label"));
    }
    Ok(Record {
        label: wire.label,
        reason: wire.reason,
        tags: wire.tags.into_iter().collect(),
        timestamp: wire.timestamp,
        duration: wire.duration,
        executable: wire.executable,
        repository: wire.repository.map(Into::into),
        main_file: wire.main_file,
        version: wire.version,
        parameters: wire.parameters.content,
        script_arguments: wire.script_arguments,
        input_data: wire.input_data,
        output_data: wire.output_data,
        dependencies: wire.dependencies,
        platform: wire.platforms.into_iter().next().unwrap_or_default(),
        outcome: wire.outcome,
        status: wire.status,
        stdout_stderr: wire.stdout_stderr,
        diff: wire.diff,
        user: wire.user,
        launch_mode: wire.launch_mode.into(),
    })
}

/// The delete-by-tag response body is the bare number of deleted records.
pub fn decode_count(body: &[u8]) -> Result<usize, CodecError> {
    let text = String::from_utf8_lossy(body);
    text.trim()
        .parse()
        .map_err(|_| CodecError::shape(format!("expected a record count, got {:?}", text.trim())))
}
