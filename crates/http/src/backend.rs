//! Registry backends for the two remote dialects.

use std::time::Duration;

use provstore_storage::{Store, StoreBackend, StoreError, StoreRegistry};

use crate::connection;
use crate::envelope::{EnvelopeStore, PRIVATE_MARKER};
use crate::rest::RestStore;
use crate::transport::UreqClient;
use crate::url;

/// Settings shared by the HTTP backends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpOptions {
    /// Overall timeout per request. `None` keeps the transport default.
    pub timeout: Option<Duration>,
    /// Hosts whose plain http(s) URLs speak the envelope dialect.
    pub envelope_hosts: Vec<String>,
}

impl HttpOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_envelope_host(mut self, host: impl Into<String>) -> Self {
        self.envelope_hosts.push(host.into());
        self
    }

    fn is_envelope_host(&self, uri: &str) -> bool {
        let (host, hostname) = match (url::host_of(uri), url::hostname_of(uri)) {
            (Some(host), Some(hostname)) => (host, hostname),
            _ => return false,
        };
        self.envelope_hosts
            .iter()
            .any(|h| h.eq_ignore_ascii_case(&host) || h.eq_ignore_ascii_case(&hostname))
    }
}

/// Envelope endpoints: URLs on a configured envelope host, private endpoint
/// URLs, and connection files.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeBackend {
    options: HttpOptions,
}

impl EnvelopeBackend {
    pub fn new(options: HttpOptions) -> Self {
        EnvelopeBackend { options }
    }
}

impl StoreBackend for EnvelopeBackend {
    fn name(&self) -> &str {
        "envelope"
    }

    fn accepts(&self, uri: &str) -> bool {
        if url::is_http_url(uri) {
            uri.contains(PRIVATE_MARKER) || self.options.is_envelope_host(uri)
        } else {
            connection::looks_like_connection_file(uri)
        }
    }

    fn open(&self, uri: &str) -> Result<Box<dyn Store>, StoreError> {
        let endpoint = if url::is_http_url(uri) {
            uri.to_string()
        } else {
            connection::endpoint_from_file(uri)?
        };
        let client = UreqClient::new(self.options.timeout);
        Ok(Box::new(EnvelopeStore::new(&endpoint, client)?))
    }
}

/// Any other `http://` or `https://` URL.
#[derive(Debug, Clone, Default)]
pub struct RestBackend {
    options: HttpOptions,
}

impl RestBackend {
    pub fn new(options: HttpOptions) -> Self {
        RestBackend { options }
    }
}

impl StoreBackend for RestBackend {
    fn name(&self) -> &str {
        "rest"
    }

    fn accepts(&self, uri: &str) -> bool {
        url::is_http_url(uri)
    }

    fn open(&self, uri: &str) -> Result<Box<dyn Store>, StoreError> {
        let client = UreqClient::new(self.options.timeout);
        Ok(Box::new(RestStore::new(uri, client)?))
    }
}

/// Register the envelope backend, then the REST backend. The envelope
/// predicate is the narrower one, so it must be asked first.
pub fn register_http_backends(registry: &mut StoreRegistry, options: &HttpOptions) {
    registry
        .register(Box::new(EnvelopeBackend::new(options.clone())))
        .register(Box::new(RestBackend::new(options.clone())));
}

/// A registry with both HTTP backends in front of the local default.
pub fn default_registry(options: &HttpOptions) -> StoreRegistry {
    let mut registry = StoreRegistry::new();
    register_http_backends(&mut registry, options);
    registry
}
