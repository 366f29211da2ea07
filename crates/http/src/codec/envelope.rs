//! JSON documents of the nested-envelope dialect.
//!
//! Every response is `{code, content}`. Records travel flat when created and
//! come back split into a `head` and a nested body whose depth depends on
//! the endpoint: `{head, body: {content}}` from record creation,
//! `{head, body: {body: {content}}}` inside a record listing.

use provstore_core::{DataItem, Dependency, Executable, ParameterSet, Platform, Record};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use time::PrimitiveDateTime;

use super::{CodecError, WireLaunchMode, WireRepository};

/// Envelope code of a successful read.
pub const CODE_OK: i64 = 200;
/// Envelope code of a successful creation.
pub const CODE_CREATED: i64 = 201;

/// Boundary used for file-upload bodies.
pub const MULTIPART_BOUNDARY: &str = "provstore-boundary-5f3a9c1e";

#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    content: Value,
}

/// Unwrap `{code, content}`, requiring `code == expected`.
pub fn open(body: &[u8], expected: i64) -> Result<Value, CodecError> {
    let envelope: Envelope = serde_json::from_slice(body)?;
    if envelope.code != expected {
        return Err(CodecError::shape(format!(
            "envelope code {}, expected {}",
            envelope.code, expected
        )));
    }
    Ok(envelope.content)
}

/// Wrap `content` the way the service does. Used by test services.
pub fn seal(code: i64, content: Value) -> Value {
    json!({ "code": code, "content": content })
}

/// Ids are numbers on the wire but only ever compared and echoed back.
fn opaque_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s),
        other => Err(serde::de::Error::custom(format!(
            "expected a numeric or string id, got {}",
            other
        ))),
    }
}

fn id_value(id: &str) -> Value {
    id.parse::<u64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(id))
}

/// A project as listed by the service. `goals` holds the long name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectSummary {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub goals: String,
    #[serde(default)]
    pub description: String,
}

impl ProjectSummary {
    pub fn to_value(&self) -> Value {
        json!({
            "id": id_value(&self.id),
            "name": self.name,
            "goals": self.goals,
            "description": self.description,
        })
    }
}

pub fn decode_projects(content: &Value) -> Result<Vec<ProjectSummary>, CodecError> {
    let projects = content
        .get("projects")
        .ok_or_else(|| CodecError::shape("content without `projects`"))?;
    Ok(Vec::<ProjectSummary>::deserialize(projects)?)
}

pub fn decode_project(content: &Value) -> Result<ProjectSummary, CodecError> {
    Ok(ProjectSummary::deserialize(content)?)
}

pub fn encode_new_project(name: &str, goals: &str, description: &str) -> Value {
    json!({ "name": name, "goals": goals, "description": description })
}

pub fn encode_project_update(goals: &str, description: &str) -> Value {
    json!({ "goals": goals, "description": description })
}

#[derive(Debug, Serialize, Deserialize)]
struct RecordHead {
    label: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    system: Platform,
    #[serde(default)]
    inputs: Vec<DataItem>,
    #[serde(default)]
    outputs: Vec<DataItem>,
    #[serde(default)]
    dependencies: Vec<Dependency>,
    #[serde(default)]
    execution: WireLaunchMode,
}

#[derive(Debug, Serialize, Deserialize)]
struct RecordContent {
    #[serde(with = "provstore_core::timestamp::serde_text")]
    timestamp: PrimitiveDateTime,
    #[serde(default)]
    reason: String,
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
    parameters: ParameterSet,
    #[serde(default)]
    script_arguments: String,
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
}

#[derive(Serialize)]
struct FlatRecord<'a> {
    #[serde(flatten)]
    head: &'a RecordHead,
    #[serde(flatten)]
    content: &'a RecordContent,
}

#[derive(Deserialize)]
struct IdOnly {
    #[serde(deserialize_with = "opaque_id")]
    id: String,
}

fn split(record: &Record) -> (RecordHead, RecordContent) {
    let head = RecordHead {
        label: record.label.clone(),
        tags: record.tags.iter().cloned().collect(),
        system: record.platform.clone(),
        inputs: record.input_data.clone(),
        outputs: record.output_data.clone(),
        dependencies: record.dependencies.clone(),
        execution: WireLaunchMode::from(&record.launch_mode),
    };
    let content = RecordContent {
        timestamp: record.timestamp,
        reason: record.reason.clone(),
        duration: record.duration,
        executable: record.executable.clone(),
        repository: record.repository.as_ref().map(WireRepository::from),
        main_file: record.main_file.clone(),
        version: record.version.clone(),
        parameters: record.parameters.clone(),
        script_arguments: record.script_arguments.clone(),
        outcome: record.outcome.clone(),
        status: record.status.clone(),
        stdout_stderr: record.stdout_stderr.clone(),
        diff: record.diff.clone(),
        user: record.user.clone(),
    };
    (head, content)
}

fn join(head: RecordHead, content: RecordContent) -> Record {
    Record {
        label: head.label,
        reason: content.reason,
        tags: head.tags.into_iter().collect(),
        timestamp: content.timestamp,
        duration: content.duration,
        executable: content.executable,
        repository: content.repository.map(Into::into),
        main_file: content.main_file,
        version: content.version,
        parameters: content.parameters,
        script_arguments: content.script_arguments,
        input_data: head.inputs,
        output_data: head.outputs,
        dependencies: head.dependencies,
        platform: head.system,
        outcome: content.outcome,
        status: content.status,
        stdout_stderr: content.stdout_stderr,
        diff: content.diff,
        user: content.user,
        launch_mode: head.execution.into(),
    }
}

/// The flat payload of `project/record/create/{project_id}`.
pub fn encode_record_payload(record: &Record) -> Result<Value, CodecError> {
    let (head, content) = split(record);
    Ok(serde_json::to_value(FlatRecord {
        head: &head,
        content: &content,
    })?)
}

/// Inverse of [`encode_record_payload`]. Used by test services.
pub fn decode_record_payload(payload: &Value) -> Result<Record, CodecError> {
    let head = RecordHead::deserialize(payload)?;
    let content = RecordContent::deserialize(payload)?;
    Ok(join(head, content))
}

/// A record together with the id the service assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRecord {
    pub id: String,
    pub record: Record,
}

fn extract(head: Option<&Value>, content: Option<&Value>) -> Result<RemoteRecord, CodecError> {
    let head = head.ok_or_else(|| CodecError::shape("record without `head`"))?;
    let content = content.ok_or_else(|| CodecError::shape("record without body content"))?;
    let id = IdOnly::deserialize(head)?.id;
    let record = join(RecordHead::deserialize(head)?, RecordContent::deserialize(content)?);
    Ok(RemoteRecord { id, record })
}

/// Decode `{head, body: {content}}`, as returned by record creation.
pub fn decode_single_record(value: &Value) -> Result<RemoteRecord, CodecError> {
    extract(value.get("head"), value.pointer("/body/content"))
}

/// Decode `{head, body: {body: {content}}}`, an element of a record listing.
pub fn decode_listed_record(value: &Value) -> Result<RemoteRecord, CodecError> {
    extract(value.get("head"), value.pointer("/body/body/content"))
}

/// Decode the `content.records[]` of `project/records/{project_id}`.
pub fn decode_record_list(content: &Value) -> Result<Vec<RemoteRecord>, CodecError> {
    content
        .get("records")
        .and_then(Value::as_array)
        .ok_or_else(|| CodecError::shape("content without `records`"))?
        .iter()
        .map(decode_listed_record)
        .collect()
}

/// Nesting used by [`frame_record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Single,
    Listed,
}

/// Build the server-side document for a stored record. Used by test services.
pub fn frame_record(id: &str, record: &Record, framing: Framing) -> Result<Value, CodecError> {
    let (head, content) = split(record);
    let mut head = serde_json::to_value(&head)?;
    if let Value::Object(map) = &mut head {
        map.insert("id".to_string(), id_value(id));
    }
    let content = serde_json::to_value(&content)?;
    let body = match framing {
        Framing::Single => json!({ "content": content }),
        Framing::Listed => json!({ "body": { "content": content } }),
    };
    Ok(json!({ "head": head, "body": body }))
}

/// Which list of a record an uploaded file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataGroup {
    Input,
    Output,
}

impl DataGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataGroup::Input => "input",
            DataGroup::Output => "output",
        }
    }
}

/// `multipart/form-data` body with one part named `file`.
pub fn multipart_file(filename: &str, bytes: &[u8]) -> Vec<u8> {
    let boundary = MULTIPART_BOUNDARY;
    let filename = quoted_filename(filename);
    let mut body: Vec<u8> = Vec::with_capacity(bytes.len() + 256);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

/// `filename` with quotes and backslashes escaped and control characters
/// dropped, safe inside a quoted header parameter.
fn quoted_filename(filename: &str) -> String {
    let mut out = String::with_capacity(filename.len());
    for c in filename.chars().filter(|c| !c.is_control()) {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY)
}
