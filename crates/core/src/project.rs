use serde::{Deserialize, Serialize};

/// Descriptive information about a project, as returned by `project_info`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Display name of the project (its long name).
    pub name: String,
    pub description: String,
}

impl ProjectInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        ProjectInfo {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Returns `true` if `name` is usable as a project name.
///
/// Names are used as a URL path segment and as a map key, so they must be
/// non-empty and may not contain `/`, `?`, `#` or whitespace.
pub fn is_valid_project_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c == '/' || c == '?' || c == '#' || c.is_whitespace())
}
