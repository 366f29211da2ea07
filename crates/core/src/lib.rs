//! provstore-core: the canonical record model shared by every backend.
//!
//! - [`Record`] -- one captured execution and its metadata
//! - [`ProjectInfo`] -- display name and description of a project
//! - [`timestamp`] -- the `YYYY-MM-DD HH:MM:SS` format used on every wire

pub mod error;
pub mod project;
pub mod record;
pub mod timestamp;

pub use error::CoreError;
pub use project::{is_valid_project_name, ProjectInfo};
pub use record::{
    DataItem, Dependency, Executable, LaunchMode, ParameterSet, Platform, Record, Repository,
};
