//! Connection files naming a private envelope endpoint.
//!
//! ```json
//! {"default": {"api": {"host": "h", "port": 8080, "path": "/api", "key": "K"}, "app": "T"}}
//! ```
//!
//! resolves to `h:8080/api/private/K/T/`. A file may instead hold the
//! endpoint URL itself on one line.

use std::fs;
use std::path::Path;

use provstore_storage::StoreError;
use serde::Deserialize;

use crate::envelope::PRIVATE_MARKER;
use crate::url;

/// Larger files are never connection files; `accepts` must stay cheap.
const MAX_CONNECTION_FILE_BYTES: u64 = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionFile {
    pub default: ConnectionProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionProfile {
    pub api: ApiEndpoint,
    pub app: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiEndpoint {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub path: String,
    pub key: String,
}

impl ConnectionFile {
    pub fn parse(text: &str) -> Result<Self, StoreError> {
        serde_json::from_str(text)
            .map_err(|e| StoreError::Config(format!("invalid connection file: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// `{host}:{port}{path}/private/{key}/{app}/`
    pub fn endpoint(&self) -> String {
        let api = &self.default.api;
        format!(
            "{}:{}{}/private/{}/{}/",
            api.host, api.port, api.path, api.key, self.default.app
        )
    }
}

/// Whether `path` is a small local file holding a complete connection
/// profile or a private endpoint URL line.
pub fn looks_like_connection_file(path: &str) -> bool {
    let path = Path::new(path);
    let small_file = fs::metadata(path)
        .map(|m| m.is_file() && m.len() <= MAX_CONNECTION_FILE_BYTES)
        .unwrap_or(false);
    if !small_file {
        return false;
    }
    fs::read_to_string(path)
        .map(|text| endpoint_from_text(&text).is_some())
        .unwrap_or(false)
}

/// The endpoint named by a connection file, in either of its forms.
pub fn endpoint_from_file(path: &str) -> Result<String, StoreError> {
    let text = fs::read_to_string(path)?;
    if is_json(&text) {
        return Ok(ConnectionFile::parse(&text)?.endpoint());
    }
    endpoint_line(&text)
        .ok_or_else(|| StoreError::Config(format!("no endpoint found in '{}'", path)))
}

fn endpoint_from_text(text: &str) -> Option<String> {
    if is_json(text) {
        ConnectionFile::parse(text).ok().map(|file| file.endpoint())
    } else {
        endpoint_line(text)
    }
}

fn is_json(text: &str) -> bool {
    text.trim_start().starts_with('{')
}

/// The first non-comment line, if it is an http(s) private endpoint URL.
fn endpoint_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| url::is_http_url(line) && line.contains(PRIVATE_MARKER))
        .map(str::to_string)
}
