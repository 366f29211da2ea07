use provstore_core::{ProjectInfo, Record};
use provstore_storage::{ensure_project, AccessError, Outcome, Store, StoreError};
use tracing::debug;

use crate::codec::{rest, CodecError};
use crate::transport::{HttpClient, HttpRequest, HttpResponse, UreqClient};
use crate::url::{self, Credentials};

const REMOTE_MAINTENANCE: &str =
    "cannot maintain a remote record store directly; contact the record store administrator";

/// A record store served over the versioned REST dialect.
///
/// Paths are `/{project}/` and `/{project}/{label}/` below the server URL.
/// Credentials embedded in the URL are removed from it and sent as basic
/// auth to the same host only.
pub struct RestStore<C: HttpClient = UreqClient> {
    server_url: String,
    credentials: Option<Credentials>,
    client: C,
}

impl<C: HttpClient> RestStore<C> {
    pub fn new(url: &str, client: C) -> Result<Self, StoreError> {
        if !url::is_http_url(url) {
            return Err(StoreError::Config(format!(
                "REST record store URL must start with http:// or https://, got '{}'",
                url
            )));
        }
        let (clean, credentials) = url::strip_credentials(url.trim());
        Ok(RestStore {
            server_url: url::with_trailing_slash(&clean),
            credentials,
            client,
        })
    }

    /// Like [`new`](Self::new), with explicit credentials taking precedence
    /// over any embedded in `url`.
    pub fn with_credentials(
        url: &str,
        username: &str,
        password: &str,
        client: C,
    ) -> Result<Self, StoreError> {
        let mut store = Self::new(url, client)?;
        let host = url::host_of(&store.server_url)
            .ok_or_else(|| StoreError::Config(format!("no host in URL '{}'", url)))?;
        store.credentials = Some(Credentials::new(host, username, password));
        Ok(store)
    }

    /// The server URL, without credentials and with a trailing slash.
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn project_url(&self, project: &str) -> String {
        format!("{}{}/", self.server_url, url::encode_segment(project))
    }

    fn record_url(&self, project: &str, label: &str) -> String {
        format!(
            "{}{}/{}/",
            self.server_url,
            url::encode_segment(project),
            url::encode_segment(label)
        )
    }

    /// Record URLs in project documents may be absolute or server-relative.
    fn resolve(&self, link: &str) -> String {
        if link.contains("://") {
            link.to_string()
        } else if let Some(path) = link.strip_prefix('/') {
            match url::origin_of(&self.server_url) {
                Some(origin) => format!("{}/{}", origin, path),
                None => format!("{}{}", self.server_url, path),
            }
        } else {
            format!("{}{}", self.server_url, link)
        }
    }

    fn send(&self, mut request: HttpRequest) -> Result<HttpResponse, StoreError> {
        if let Some(credentials) = &self.credentials {
            if credentials.applies_to(&request.url) {
                request = request.header("Authorization", credentials.header_value());
            }
        }
        debug!(method = %request.method, url = %request.url, "rest request");
        self.client
            .execute(&request)
            .map_err(|e| AccessError::network(request.url.clone(), e).into())
    }

    fn get_resource(&self, url: &str, resource: &str) -> Result<HttpResponse, StoreError> {
        self.send(HttpRequest::get(url).header("Accept", rest::accept(resource)))
    }

    fn put_resource(
        &self,
        url: &str,
        resource: &str,
        body: Vec<u8>,
    ) -> Result<HttpResponse, StoreError> {
        self.send(
            HttpRequest::put(url)
                .header("Accept", rest::accept(resource))
                .header("Content-Type", rest::media_type(resource))
                .body(body),
        )
    }

    fn put_project(&self, name: &str, long_name: &str, description: &str) -> Result<HttpResponse, StoreError> {
        let body = rest::encode_project_info(long_name, description).map_err(malformed(&self.server_url))?;
        self.put_resource(&self.project_url(name), "project", body)
    }

    fn fetch_project(&self, project: &str, tags: &[String]) -> Result<rest::ProjectDocument, StoreError> {
        let mut url = self.project_url(project);
        if !tags.is_empty() {
            let encoded: Vec<String> = tags.iter().map(|t| url::encode_segment(t)).collect();
            url = format!("{}?tags={}", url, encoded.join(","));
        }
        let response = self.get_resource(&url, "project")?;
        expect_status(&url, &response, &[200])?;
        rest::decode_project(&response.body).map_err(malformed(&url))
    }

    fn fetch_record(&self, url: &str, project: &str, label: &str) -> Result<Record, StoreError> {
        let response = self.get_resource(url, "record")?;
        if response.status == 404 {
            return Err(StoreError::not_found(project, label));
        }
        expect_status(url, &response, &[200])?;
        rest::decode_record(&response.body).map_err(malformed(url))
    }
}

fn expect_status(url: &str, response: &HttpResponse, accepted: &[u16]) -> Result<(), StoreError> {
    if accepted.contains(&response.status) {
        Ok(())
    } else {
        Err(AccessError::status(url, response.status, response.text()).into())
    }
}

fn malformed(url: &str) -> impl Fn(CodecError) -> StoreError + '_ {
    move |e| AccessError::malformed(url, e).into()
}

impl<C: HttpClient> Store for RestStore<C> {
    fn describe(&self) -> String {
        format!("Interface to remote record store at {} using HTTP", self.server_url)
    }

    fn list_projects(&self) -> Result<Vec<String>, StoreError> {
        let response = self.get_resource(&self.server_url, "project-list")?;
        expect_status(&self.server_url, &response, &[200])?;
        rest::decode_project_list(&response.body).map_err(malformed(&self.server_url))
    }

    fn create_project(&self, name: &str, long_name: &str, description: &str) -> Result<(), StoreError> {
        let response = self.put_project(name, long_name, description)?;
        expect_status(&self.project_url(name), &response, &[201])
    }

    fn update_project_info(
        &self,
        name: &str,
        long_name: &str,
        description: &str,
    ) -> Result<(), StoreError> {
        let response = self.put_project(name, long_name, description)?;
        expect_status(&self.project_url(name), &response, &[200])
    }

    fn has_project(&self, name: &str) -> Result<bool, StoreError> {
        let url = self.project_url(name);
        let response = self.get_resource(&url, "project")?;
        match response.status {
            200 => Ok(true),
            401 | 404 => Ok(false),
            _ => Err(AccessError::status(url, response.status, response.text()).into()),
        }
    }

    fn project_info(&self, name: &str) -> Result<ProjectInfo, StoreError> {
        Ok(self.fetch_project(name, &[])?.info())
    }

    fn save(&self, project: &str, record: &Record) -> Result<(), StoreError> {
        ensure_project(self, project)?;
        let url = self.record_url(project, &record.label);
        let body = rest::encode_record(record).map_err(malformed(&url))?;
        let response = self.put_resource(&url, "record", body)?;
        expect_status(&url, &response, &[200, 201])
    }

    fn get(&self, project: &str, label: &str) -> Result<Record, StoreError> {
        self.fetch_record(&self.record_url(project, label), project, label)
    }

    fn list(&self, project: &str, tags: &[String]) -> Result<Vec<Record>, StoreError> {
        let document = self.fetch_project(project, tags)?;
        document
            .records
            .iter()
            .map(|link| {
                self.fetch_record(&self.resolve(link), project, &url::last_segment(link))
            })
            .collect()
    }

    fn delete(&self, project: &str, label: &str) -> Result<Outcome<()>, StoreError> {
        let url = self.record_url(project, label);
        let response = self.send(HttpRequest::delete(&url))?;
        expect_status(&url, &response, &[204])?;
        Ok(Outcome::Done(()))
    }

    fn delete_by_tag(&self, project: &str, tag: &str) -> Result<Outcome<usize>, StoreError> {
        let url = format!("{}tag/{}/", self.project_url(project), url::encode_segment(tag));
        let response = self.send(HttpRequest::delete(&url))?;
        expect_status(&url, &response, &[200])?;
        let count = rest::decode_count(&response.body).map_err(malformed(&url))?;
        Ok(Outcome::Done(count))
    }

    fn most_recent(&self, project: &str) -> Result<String, StoreError> {
        let url = format!("{}last/", self.project_url(project));
        let response = self.get_resource(&url, "record")?;
        if response.status == 404 {
            return Err(StoreError::EmptyProject {
                project: project.to_string(),
            });
        }
        expect_status(&url, &response, &[200])?;
        Ok(rest::decode_record(&response.body).map_err(malformed(&url))?.label)
    }

    fn clear(&self) -> Result<Outcome<()>, StoreError> {
        Ok(Outcome::unsupported("clear", REMOTE_MAINTENANCE))
    }

    fn backup(&self) -> Result<Outcome<()>, StoreError> {
        Ok(Outcome::unsupported("backup", REMOTE_MAINTENANCE))
    }

    fn remove(&self) -> Result<Outcome<()>, StoreError> {
        Ok(Outcome::unsupported("remove", REMOTE_MAINTENANCE))
    }

    fn as_dyn(&self) -> &dyn Store {
        self
    }
}
