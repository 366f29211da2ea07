//! provstore-http: record stores reached over HTTP.
//!
//! Two dialects are supported:
//!
//! - [`RestStore`] -- a versioned REST API with one resource per project and
//!   per record, vendor media types and basic auth
//! - [`EnvelopeStore`] -- a managed service that wraps every answer in
//!   `{code, content}`, addresses things by numeric id and uploads data files
//!
//! [`register_http_backends`] adds both to a
//! [`StoreRegistry`](provstore_storage::StoreRegistry) so connection strings
//! pick the right one. Network access goes through the [`HttpClient`] trait;
//! [`UreqClient`] is the production implementation.

pub mod backend;
pub mod codec;
pub mod connection;
pub mod envelope;
pub mod rest;
pub mod transport;
pub mod url;

pub use backend::{default_registry, register_http_backends, EnvelopeBackend, HttpOptions, RestBackend};
pub use connection::ConnectionFile;
pub use envelope::EnvelopeStore;
pub use rest::RestStore;
pub use transport::{HttpClient, HttpRequest, HttpResponse, Method, UreqClient};
pub use url::Credentials;
