//! Connection-string driven backend selection.
//!
//! A [`StoreRegistry`] holds an ordered list of [`StoreBackend`]s. Opening a
//! URI asks each backend in registration order whether it accepts the URI and
//! opens the first one that does. When none does, the registry's default
//! backend (the local JSON file store unless configured otherwise) opens it.
//!
//! The registry is an ordinary value: build it once at startup and pass it to
//! whatever needs to resolve stores.

use tracing::debug;

use crate::error::StoreError;
use crate::file::JsonFileStore;
use crate::traits::Store;

/// A kind of store the registry can open.
///
/// `accepts` runs on every store acquisition, so it must be cheap and free of
/// side effects: prefix checks, or at most reading a small local file.
pub trait StoreBackend: Send + Sync {
    /// Short identifier, e.g. `"rest"` or `"local"`.
    fn name(&self) -> &str;

    /// Whether this backend handles `uri`.
    fn accepts(&self, uri: &str) -> bool;

    /// Open a store for `uri`. Errors propagate to the caller unchanged.
    fn open(&self, uri: &str) -> Result<Box<dyn Store>, StoreError>;
}

/// The default backend: a [`JsonFileStore`] at the given path.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalBackend;

impl StoreBackend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    fn accepts(&self, uri: &str) -> bool {
        !uri.contains("://")
    }

    fn open(&self, uri: &str) -> Result<Box<dyn Store>, StoreError> {
        if uri.is_empty() {
            return Err(StoreError::Config("empty record store path".into()));
        }
        Ok(Box::new(JsonFileStore::new(uri)))
    }
}

/// Ordered table of store backends plus a fallback.
pub struct StoreRegistry {
    backends: Vec<Box<dyn StoreBackend>>,
    default: Box<dyn StoreBackend>,
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreRegistry {
    /// An empty registry whose fallback is [`LocalBackend`].
    pub fn new() -> Self {
        Self::with_default(Box::new(LocalBackend))
    }

    /// An empty registry with a custom fallback backend.
    pub fn with_default(default: Box<dyn StoreBackend>) -> Self {
        StoreRegistry {
            backends: Vec::new(),
            default,
        }
    }

    /// Append a backend. Earlier registrations win when several accept a URI.
    pub fn register(&mut self, backend: Box<dyn StoreBackend>) -> &mut Self {
        self.backends.push(backend);
        self
    }

    /// Names of the registered backends in evaluation order (fallback excluded).
    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    fn select(&self, uri: &str) -> &dyn StoreBackend {
        self.backends
            .iter()
            .find(|b| b.accepts(uri))
            .map(|b| &**b)
            .unwrap_or(&*self.default)
    }

    /// Name of the backend that would open `uri`.
    pub fn backend_name(&self, uri: &str) -> &str {
        self.select(uri).name()
    }

    /// Open the store for `uri`.
    pub fn open(&self, uri: &str) -> Result<Box<dyn Store>, StoreError> {
        let backend = self.select(uri);
        debug!(uri, backend = backend.name(), "opening record store");
        backend.open(uri)
    }
}
