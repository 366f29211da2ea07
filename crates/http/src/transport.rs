//! HTTP client seam.
//!
//! Stores talk to the network through [`HttpClient`], so the wire handling
//! can be exercised against in-process fakes. [`UreqClient`] is the real
//! implementation.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        HttpRequest {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of header `name`, compared case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body of a response. Every status is delivered here; deciding
/// which ones are failures is the store's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        HttpResponse {
            status,
            body: body.into(),
        }
    }

    /// Body as text, lossily decoded, for error messages.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Something that can perform a blocking HTTP exchange.
///
/// `Err` is reserved for failures where no response was received
/// (connection refused, timeout, TLS failure).
pub trait HttpClient: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String>;
}

impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        (**self).execute(request)
    }
}

/// [`HttpClient`] backed by a `ureq` agent.
///
/// The agent is configured to hand back 4xx/5xx responses instead of turning
/// them into errors, because several operations treat 401/404 as answers.
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    /// A client with an overall per-request timeout (`None` = ureq default).
    pub fn new(timeout: Option<Duration>) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build();
        UreqClient {
            agent: config.into(),
        }
    }

    /// Wrap a preconfigured agent. It must have `http_status_as_error(false)`.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        UreqClient { agent }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new(None)
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl HttpClient for UreqClient {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        debug!(method = %request.method, url = %request.url, "http request");
        let url = request.url.as_str();
        let body = request.body.as_slice();
        let result = match request.method {
            Method::Get => with_headers(self.agent.get(url), &request.headers).call(),
            Method::Delete => with_headers(self.agent.delete(url), &request.headers).call(),
            Method::Put => with_headers(self.agent.put(url), &request.headers).send(body),
            Method::Post => with_headers(self.agent.post(url), &request.headers).send(body),
        };
        let response = result.map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_vec()
            .map_err(|e| format!("error reading response body: {}", e))?;
        debug!(status, bytes = body.len(), "http response");
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_collects_headers_and_body() {
        let req = HttpRequest::put("http://h/p/")
            .header("Content-Type", "application/json")
            .body(b"{}".to_vec());
        assert_eq!(req.method, Method::Put);
        assert_eq!(req.header_value("content-type"), Some("application/json"));
        assert_eq!(req.body, b"{}");
    }

    #[test]
    fn missing_header_is_none() {
        assert_eq!(HttpRequest::get("http://h/").header_value("Accept"), None);
    }

    #[test]
    fn response_text_is_lossy() {
        let resp = HttpResponse::new(500, vec![b'o', b'k', 0xff]);
        assert!(resp.text().starts_with("ok"));
    }

    #[test]
    fn method_names() {
        assert_eq!(Method::Delete.to_string(), "DELETE");
        assert_eq!(Method::Get.as_str(), "GET");
    }
}
