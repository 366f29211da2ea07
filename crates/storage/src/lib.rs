//! provstore-storage: the store abstraction shared by every backend.
//!
//! - [`Store`] -- the uniform contract (projects, records, sync, maintenance)
//! - [`StoreError`] / [`AccessError`] -- failures; [`Outcome`] -- policy refusals
//! - [`StoreRegistry`] / [`StoreBackend`] -- URI-driven backend selection
//! - [`sync_project`] / [`sync_all`] -- one-directional merge between stores
//! - [`JsonFileStore`], [`MemoryStore`] -- local backends
//! - [`conformance`] -- backend-agnostic test suite

pub mod conformance;
mod error;
mod file;
mod memory;
mod outcome;
mod registry;
mod sync;
mod table;
mod traits;

pub use error::{AccessError, StoreError};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use outcome::Outcome;
pub use registry::{LocalBackend, StoreBackend, StoreRegistry};
pub use sync::{ensure_project, sync_all, sync_project, SyncReport};
pub use traits::Store;
