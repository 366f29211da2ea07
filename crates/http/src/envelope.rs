use std::fs;

use provstore_core::{DataItem, ProjectInfo, Record};
use provstore_storage::{AccessError, Outcome, Store, StoreError};
use serde_json::Value;
use tracing::{debug, info};

use crate::codec::envelope::{self, DataGroup, ProjectSummary, RemoteRecord, CODE_CREATED, CODE_OK};
use crate::codec::CodecError;
use crate::transport::{HttpClient, HttpRequest, HttpResponse, UreqClient};
use crate::url;

/// Application token used when the endpoint URL names none.
pub const DEFAULT_APP: &str = "no-app";

/// Marker preceding the access key in private endpoint URLs.
pub const PRIVATE_MARKER: &str = "/private/";

const SERVICE_POLICY: &str = "the remote service does not allow deleting records or projects";

/// A record store served through the nested-envelope dialect.
///
/// Projects and records are addressed by numeric ids the service assigns.
/// Every operation that names a project first lists all projects to find
/// its id. Deletion and whole-store maintenance are refused by the service.
pub struct EnvelopeStore<C: HttpClient = UreqClient> {
    base_url: String,
    client: C,
}

/// `http://` is assumed when no scheme is given, the URL always ends with
/// `/`, and a private endpoint with only a key gets [`DEFAULT_APP`].
pub fn normalize_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    let mut base = if endpoint.contains("://") {
        url::with_trailing_slash(endpoint)
    } else {
        url::with_trailing_slash(&format!("http://{}", endpoint))
    };
    if let Some((_, after)) = base.split_once(PRIVATE_MARKER) {
        let segments = after.split('/').filter(|s| !s.is_empty()).count();
        if segments == 1 {
            base = format!("{}{}/", base, DEFAULT_APP);
        }
    }
    base
}

impl<C: HttpClient> EnvelopeStore<C> {
    pub fn new(endpoint: &str, client: C) -> Result<Self, StoreError> {
        if endpoint.trim().is_empty() {
            return Err(StoreError::Config("empty envelope endpoint".into()));
        }
        Ok(EnvelopeStore {
            base_url: normalize_endpoint(endpoint),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, StoreError> {
        debug!(method = %request.method, url = %request.url, "envelope request");
        let response = self
            .client
            .execute(&request)
            .map_err(|e| AccessError::network(request.url.clone(), e))?;
        if response.status != 200 {
            return Err(AccessError::status(request.url, response.status, response.text()).into());
        }
        Ok(response)
    }

    fn get_content(&self, path: &str) -> Result<Value, StoreError> {
        let url = self.endpoint(path);
        let response = self.send(HttpRequest::get(&url).header("Accept", "application/json"))?;
        envelope::open(&response.body, CODE_OK).map_err(malformed(&url, &response))
    }

    fn post_content(&self, path: &str, body: &Value, expected: i64) -> Result<Value, StoreError> {
        let url = self.endpoint(path);
        let bytes = serde_json::to_vec(body)?;
        let response = self.send(
            HttpRequest::post(&url)
                .header("Accept", "application/json")
                .header("Content-Type", "application/json")
                .body(bytes),
        )?;
        envelope::open(&response.body, expected).map_err(malformed(&url, &response))
    }

    fn projects(&self) -> Result<Vec<ProjectSummary>, StoreError> {
        let content = self.get_content("projects")?;
        envelope::decode_projects(&content).map_err(|e| self.malformed_at("projects", e))
    }

    fn find_project(&self, name: &str) -> Result<Option<ProjectSummary>, StoreError> {
        Ok(self.projects()?.into_iter().find(|p| p.name == name))
    }

    fn require_project(&self, name: &str) -> Result<ProjectSummary, StoreError> {
        self.find_project(name)?.ok_or_else(|| {
            AccessError {
                url: self.endpoint("projects"),
                status: None,
                body: format!("no project named '{}'", name),
            }
            .into()
        })
    }

    fn create(&self, name: &str, goals: &str, description: &str) -> Result<ProjectSummary, StoreError> {
        let body = envelope::encode_new_project(name, goals, description);
        let content = self.post_content("project/create", &body, CODE_CREATED)?;
        envelope::decode_project(&content).map_err(|e| self.malformed_at("project/create", e))
    }

    fn records(&self, project: &ProjectSummary) -> Result<Vec<RemoteRecord>, StoreError> {
        let path = format!("project/records/{}", project.id);
        let content = self.get_content(&path)?;
        envelope::decode_record_list(&content).map_err(|e| self.malformed_at(&path, e))
    }

    fn upload(&self, record_id: &str, group: DataGroup, item: &DataItem) -> Result<(), StoreError> {
        let local = item.local_path();
        let bytes = fs::read(&local)?;
        let filename = local
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| item.path.clone());
        let url = self.endpoint(&format!("file/upload/{}/{}", group.as_str(), record_id));
        debug!(record_id, group = group.as_str(), file = %local.display(), "uploading data file");
        self.send(
            HttpRequest::post(url)
                .header("Content-Type", envelope::multipart_content_type())
                .body(envelope::multipart_file(&filename, &bytes)),
        )?;
        Ok(())
    }

    fn malformed_at(&self, path: &str, error: CodecError) -> StoreError {
        AccessError::malformed(self.endpoint(path), error).into()
    }
}

fn malformed<'a>(url: &'a str, response: &'a HttpResponse) -> impl Fn(CodecError) -> StoreError + 'a {
    move |e| {
        AccessError {
            url: url.to_string(),
            status: Some(response.status),
            body: format!("{}: {}", e, response.text()),
        }
        .into()
    }
}

impl<C: HttpClient> Store for EnvelopeStore<C> {
    fn describe(&self) -> String {
        format!("Interface to remote envelope record store at {}", self.base_url)
    }

    fn list_projects(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.projects()?.into_iter().map(|p| p.name).collect())
    }

    fn create_project(&self, name: &str, long_name: &str, description: &str) -> Result<(), StoreError> {
        self.create(name, long_name, description)?;
        Ok(())
    }

    fn update_project_info(
        &self,
        name: &str,
        long_name: &str,
        description: &str,
    ) -> Result<(), StoreError> {
        let project = self.require_project(name)?;
        let body = envelope::encode_project_update(long_name, description);
        self.post_content(&format!("project/update/{}", project.id), &body, CODE_OK)?;
        Ok(())
    }

    fn has_project(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.find_project(name)?.is_some())
    }

    fn project_info(&self, name: &str) -> Result<ProjectInfo, StoreError> {
        let project = self.require_project(name)?;
        let display = if project.goals.is_empty() {
            project.name
        } else {
            project.goals
        };
        Ok(ProjectInfo::new(display, project.description))
    }

    /// Creates the record, then uploads every input and output file.
    /// A failed upload leaves the created record on the server.
    fn save(&self, project: &str, record: &Record) -> Result<(), StoreError> {
        let summary = match self.find_project(project)? {
            Some(summary) => summary,
            None => {
                info!(project, store = %self.base_url, "creating project");
                self.create(project, "", "")?
            }
        };
        let path = format!("project/record/create/{}", summary.id);
        let payload = envelope::encode_record_payload(record).map_err(|e| self.malformed_at(&path, e))?;
        let content = self.post_content(&path, &payload, CODE_CREATED)?;
        let created = envelope::decode_single_record(&content).map_err(|e| self.malformed_at(&path, e))?;
        if created.record.label != record.label {
            return Err(self.malformed_at(
                &path,
                CodecError::Shape(format!(
                    "created record is labelled '{}', expected '{}'",
                    created.record.label, record.label
                )),
            ));
        }

        for item in &record.input_data {
            self.upload(&created.id, DataGroup::Input, item)?;
        }
        for item in &record.output_data {
            self.upload(&created.id, DataGroup::Output, item)?;
        }
        info!(project, label = %record.label, id = %created.id, "record saved");
        Ok(())
    }

    fn get(&self, project: &str, label: &str) -> Result<Record, StoreError> {
        let summary = self.require_project(project)?;
        self.records(&summary)?
            .into_iter()
            .find(|r| r.record.label == label)
            .map(|r| r.record)
            .ok_or_else(|| StoreError::not_found(project, label))
    }

    fn list(&self, project: &str, tags: &[String]) -> Result<Vec<Record>, StoreError> {
        let summary = self.require_project(project)?;
        Ok(self
            .records(&summary)?
            .into_iter()
            .map(|r| r.record)
            .filter(|r| r.matches_tags(tags))
            .collect())
    }

    fn delete(&self, _project: &str, _label: &str) -> Result<Outcome<()>, StoreError> {
        Ok(Outcome::unsupported("delete", SERVICE_POLICY))
    }

    fn delete_by_tag(&self, _project: &str, _tag: &str) -> Result<Outcome<usize>, StoreError> {
        Ok(Outcome::unsupported("delete_by_tag", SERVICE_POLICY))
    }

    fn most_recent(&self, project: &str) -> Result<String, StoreError> {
        self.list(project, &[])?
            .into_iter()
            .max_by_key(|r| r.timestamp)
            .map(|r| r.label)
            .ok_or_else(|| StoreError::EmptyProject {
                project: project.to_string(),
            })
    }

    fn clear(&self) -> Result<Outcome<()>, StoreError> {
        Ok(Outcome::unsupported("clear", SERVICE_POLICY))
    }

    fn backup(&self) -> Result<Outcome<()>, StoreError> {
        Ok(Outcome::unsupported("backup", SERVICE_POLICY))
    }

    fn remove(&self) -> Result<Outcome<()>, StoreError> {
        Ok(Outcome::unsupported("remove", SERVICE_POLICY))
    }

    fn as_dyn(&self) -> &dyn Store {
        self
    }
}
