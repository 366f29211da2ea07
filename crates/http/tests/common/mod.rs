//! In-process stand-ins for the two remote services.
//!
//! Both implement [`HttpClient`], keep their state behind a lock and record
//! every request they receive so tests can assert on the wire traffic.

#![allow(dead_code)]

use std::collections::BTreeMap;

use parking_lot::Mutex;
use provstore_http::codec::envelope::{self, Framing};
use provstore_http::{HttpClient, HttpRequest, HttpResponse, Method};
use serde_json::{json, Value};

fn path_and_query<'a>(base: &str, url: &'a str) -> Option<(Vec<&'a str>, Option<&'a str>)> {
    let rest = url.get(base.len()..).filter(|_| url.starts_with(base))?;
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };
    Some((path.split('/').filter(|s| !s.is_empty()).collect(), query))
}

fn json_response(status: u16, value: &Value) -> HttpResponse {
    HttpResponse::new(status, serde_json::to_vec(value).unwrap_or_default())
}

fn tags_of(record: &Value) -> Vec<String> {
    record["tags"]
        .as_array()
        .map(|tags| {
            tags.iter()
                .filter_map(|t| t.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

// ── REST ─────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct RestProject {
    name: String,
    description: String,
    records: BTreeMap<String, Value>,
}

#[derive(Default)]
pub struct FakeRestService {
    pub base: String,
    projects: Mutex<BTreeMap<String, RestProject>>,
    requests: Mutex<Vec<HttpRequest>>,
    required_auth: Option<String>,
}

impl FakeRestService {
    pub const BASE: &'static str = "http://store.example/";

    pub fn new() -> Self {
        FakeRestService {
            base: Self::BASE.to_string(),
            ..Default::default()
        }
    }

    /// Answer 401 unless requests carry this `Authorization` value.
    pub fn requiring_auth(header_value: &str) -> Self {
        FakeRestService {
            required_auth: Some(header_value.to_string()),
            ..Self::new()
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn record_count(&self, project: &str) -> usize {
        self.projects
            .lock()
            .get(project)
            .map(|p| p.records.len())
            .unwrap_or(0)
    }

    fn record_url(&self, project: &str, label: &str) -> String {
        format!("{}{}/{}/", self.base, project, label)
    }

    fn handle(&self, request: &HttpRequest) -> HttpResponse {
        if let Some(expected) = &self.required_auth {
            if request.header_value("Authorization") != Some(expected.as_str()) {
                return HttpResponse::new(401, "authentication required");
            }
        }
        let (segments, query) = match path_and_query(&self.base, &request.url) {
            Some(parts) => parts,
            None => return HttpResponse::new(404, "unknown host"),
        };
        let mut projects = self.projects.lock();

        match (request.method, segments.as_slice()) {
            (Method::Get, []) => {
                let list: Vec<Value> = projects.keys().map(|id| json!({ "id": id })).collect();
                json_response(200, &Value::Array(list))
            }
            (Method::Put, [project]) => {
                let body: Value = match serde_json::from_slice(&request.body) {
                    Ok(body) => body,
                    Err(e) => return HttpResponse::new(400, e.to_string()),
                };
                let name = body["name"].as_str().unwrap_or_default().to_string();
                let description = body["description"].as_str().unwrap_or_default().to_string();
                match projects.get_mut(*project) {
                    Some(existing) => {
                        existing.name = name;
                        existing.description = description;
                        HttpResponse::new(200, "")
                    }
                    None => {
                        projects.insert(
                            project.to_string(),
                            RestProject {
                                name,
                                description,
                                records: BTreeMap::new(),
                            },
                        );
                        HttpResponse::new(201, "")
                    }
                }
            }
            (Method::Get, [project]) => {
                let Some(p) = projects.get(*project) else {
                    return HttpResponse::new(404, "no such project");
                };
                let wanted: Vec<&str> = query
                    .and_then(|q| q.strip_prefix("tags="))
                    .map(|t| t.split(',').collect())
                    .unwrap_or_default();
                let links: Vec<String> = p
                    .records
                    .iter()
                    .filter(|(_, r)| {
                        wanted.is_empty() || tags_of(r).iter().any(|t| wanted.contains(&t.as_str()))
                    })
                    .map(|(label, _)| self.record_url(project, label))
                    .collect();
                json_response(
                    200,
                    &json!({
                        "id": project,
                        "name": p.name,
                        "description": p.description,
                        "records": links,
                    }),
                )
            }
            (Method::Get, [project, "last"]) => {
                let Some(p) = projects.get(*project) else {
                    return HttpResponse::new(404, "no such project");
                };
                match p
                    .records
                    .values()
                    .max_by_key(|r| r["timestamp"].as_str().unwrap_or_default().to_string())
                {
                    Some(record) => json_response(200, record),
                    None => HttpResponse::new(404, "no records"),
                }
            }
            (Method::Delete, [project, "tag", tag]) => {
                let Some(p) = projects.get_mut(*project) else {
                    return HttpResponse::new(404, "no such project");
                };
                let before = p.records.len();
                p.records.retain(|_, r| !tags_of(r).iter().any(|t| t == tag));
                HttpResponse::new(200, (before - p.records.len()).to_string())
            }
            (Method::Put, [project, label]) => {
                let Some(p) = projects.get_mut(*project) else {
                    return HttpResponse::new(404, "no such project");
                };
                let body: Value = match serde_json::from_slice(&request.body) {
                    Ok(body) => body,
                    Err(e) => return HttpResponse::new(400, e.to_string()),
                };
                match p.records.insert(label.to_string(), body) {
                    Some(_) => HttpResponse::new(200, ""),
                    None => HttpResponse::new(201, ""),
                }
            }
            (Method::Get, [project, label]) => {
                match projects.get(*project).and_then(|p| p.records.get(*label)) {
                    Some(record) => json_response(200, record),
                    None => HttpResponse::new(404, "no such record"),
                }
            }
            (Method::Delete, [project, label]) => {
                match projects.get_mut(*project).and_then(|p| p.records.remove(*label)) {
                    Some(_) => HttpResponse::new(204, ""),
                    None => HttpResponse::new(404, "no such record"),
                }
            }
            _ => HttpResponse::new(405, "method not allowed"),
        }
    }
}

impl HttpClient for FakeRestService {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        self.requests.lock().push(request.clone());
        Ok(self.handle(request))
    }
}

// ── Envelope ─────────────────────────────────────────────────────────────────

struct EnvelopeProject {
    id: u64,
    name: String,
    goals: String,
    description: String,
    /// (record id, flat payload)
    records: Vec<(u64, Value)>,
}

impl EnvelopeProject {
    fn summary(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "goals": self.goals,
            "description": self.description,
        })
    }
}

/// One received file upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub group: String,
    pub record_id: String,
    pub filename: String,
    pub content: Vec<u8>,
}

#[derive(Default)]
struct EnvelopeState {
    next_id: u64,
    projects: Vec<EnvelopeProject>,
    uploads: Vec<Upload>,
}

impl EnvelopeState {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct FakeEnvelopeService {
    pub base: String,
    state: Mutex<EnvelopeState>,
    requests: Mutex<Vec<HttpRequest>>,
    fail_uploads: bool,
}

impl Default for FakeEnvelopeService {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeEnvelopeService {
    pub const BASE: &'static str = "http://envelope.example/api/private/K/T/";

    pub fn new() -> Self {
        FakeEnvelopeService {
            base: Self::BASE.to_string(),
            state: Mutex::new(EnvelopeState::default()),
            requests: Mutex::new(Vec::new()),
            fail_uploads: false,
        }
    }

    /// A service that answers every file upload with HTTP 500.
    pub fn failing_uploads() -> Self {
        FakeEnvelopeService {
            fail_uploads: true,
            ..Self::new()
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.state.lock().uploads.clone()
    }

    pub fn record_count(&self, project: &str) -> usize {
        self.state
            .lock()
            .projects
            .iter()
            .find(|p| p.name == project)
            .map(|p| p.records.len())
            .unwrap_or(0)
    }

    fn ok(code: i64, content: Value) -> HttpResponse {
        json_response(200, &envelope::seal(code, content))
    }

    fn handle(&self, request: &HttpRequest) -> HttpResponse {
        let (segments, _) = match path_and_query(&self.base, &request.url) {
            Some(parts) => parts,
            None => return HttpResponse::new(404, "unknown endpoint"),
        };
        let mut state = self.state.lock();

        match (request.method, segments.as_slice()) {
            (Method::Get, ["projects"]) => {
                let list: Vec<Value> = state.projects.iter().map(EnvelopeProject::summary).collect();
                Self::ok(200, json!({ "projects": list }))
            }
            (Method::Post, ["project", "create"]) => {
                let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
                let name = body["name"].as_str().unwrap_or_default().to_string();
                if state.projects.iter().any(|p| p.name == name) {
                    return Self::ok(409, json!({ "error": "project exists" }));
                }
                let id = state.allocate();
                let project = EnvelopeProject {
                    id,
                    name,
                    goals: body["goals"].as_str().unwrap_or_default().to_string(),
                    description: body["description"].as_str().unwrap_or_default().to_string(),
                    records: Vec::new(),
                };
                let summary = project.summary();
                state.projects.push(project);
                Self::ok(201, summary)
            }
            (Method::Post, ["project", "update", id]) => {
                let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
                let Some(project) = state.projects.iter_mut().find(|p| p.id.to_string() == *id)
                else {
                    return Self::ok(404, Value::Null);
                };
                project.goals = body["goals"].as_str().unwrap_or_default().to_string();
                project.description = body["description"].as_str().unwrap_or_default().to_string();
                Self::ok(200, project.summary())
            }
            (Method::Get, ["project", "records", id]) => {
                let Some(project) = state.projects.iter().find(|p| p.id.to_string() == *id) else {
                    return Self::ok(404, Value::Null);
                };
                let mut records = Vec::new();
                for (rid, payload) in &project.records {
                    let framed = envelope::decode_record_payload(payload)
                        .and_then(|r| envelope::frame_record(&rid.to_string(), &r, Framing::Listed));
                    match framed {
                        Ok(doc) => records.push(doc),
                        Err(e) => return HttpResponse::new(500, e.to_string()),
                    }
                }
                Self::ok(200, json!({ "records": records }))
            }
            (Method::Post, ["project", "record", "create", id]) => {
                let payload: Value = match serde_json::from_slice(&request.body) {
                    Ok(payload) => payload,
                    Err(e) => return HttpResponse::new(400, e.to_string()),
                };
                let record = match envelope::decode_record_payload(&payload) {
                    Ok(record) => record,
                    Err(e) => return Self::ok(400, json!({ "error": e.to_string() })),
                };
                let rid = state.allocate();
                let Some(project) = state.projects.iter_mut().find(|p| p.id.to_string() == *id)
                else {
                    return Self::ok(404, Value::Null);
                };
                project.records.retain(|(_, p)| p["label"] != payload["label"]);
                project.records.push((rid, payload));
                match envelope::frame_record(&rid.to_string(), &record, Framing::Single) {
                    Ok(doc) => Self::ok(201, doc),
                    Err(e) => HttpResponse::new(500, e.to_string()),
                }
            }
            (Method::Post, ["file", "upload", group, record_id]) => {
                if self.fail_uploads {
                    return HttpResponse::new(500, "storage backend unavailable");
                }
                let Some((filename, content)) = parse_multipart(&request.body) else {
                    return HttpResponse::new(400, "bad multipart body");
                };
                state.uploads.push(Upload {
                    group: group.to_string(),
                    record_id: record_id.to_string(),
                    filename,
                    content,
                });
                Self::ok(201, Value::Null)
            }
            _ => HttpResponse::new(405, "method not allowed"),
        }
    }
}

/// Extract the filename and bytes of the single `file` part.
fn parse_multipart(body: &[u8]) -> Option<(String, Vec<u8>)> {
    let text = String::from_utf8_lossy(body);
    let start = text.find("filename=\"")? + "filename=\"".len();
    let end = start + text[start..].find('"')?;
    let filename = text[start..end].to_string();

    let header_end = find(body, b"\r\n\r\n")? + 4;
    let closing = format!("\r\n--{}--", envelope::MULTIPART_BOUNDARY);
    let content_end = find(body, closing.as_bytes())?;
    Some((filename, body[header_end..content_end].to_vec()))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

impl HttpClient for FakeEnvelopeService {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        self.requests.lock().push(request.clone());
        Ok(self.handle(request))
    }
}
