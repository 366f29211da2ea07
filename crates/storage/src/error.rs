use std::fmt;

/// Context for an unexpected answer from a backend.
///
/// `status` is `None` when the request never produced an HTTP response
/// (connection refused, DNS failure) or when the failure is local to the
/// response handling (malformed JSON, missing envelope field).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("error accessing {url}\n{}{body}", status_prefix(.status))]
pub struct AccessError {
    pub url: String,
    pub status: Option<u16>,
    pub body: String,
}

impl AccessError {
    /// The backend answered with a status code the operation does not accept.
    pub fn status(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        AccessError {
            url: url.into(),
            status: Some(status),
            body: body.into(),
        }
    }

    /// The request failed before any response was received.
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        AccessError {
            url: url.into(),
            status: None,
            body: message.into(),
        }
    }

    /// The response arrived but could not be interpreted.
    pub fn malformed(url: impl Into<String>, message: impl fmt::Display) -> Self {
        AccessError {
            url: url.into(),
            status: None,
            body: format!("malformed response: {}", message),
        }
    }
}

fn status_prefix(status: &Option<u16>) -> String {
    status.map(|s| format!("{}: ", s)).unwrap_or_default()
}

/// All errors that can be returned by a [`Store`](crate::Store) implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unexpected status, network failure or malformed response.
    #[error("{0}")]
    Access(AccessError),

    /// No record with this label in the project. Callers probe for absence
    /// with this, so it is kept apart from access failures.
    #[error("no record labelled '{label}' in project '{project}'")]
    NotFound { project: String, label: String },

    /// The project does not exist in a local store.
    #[error("no project named '{project}'")]
    ProjectNotFound { project: String },

    /// The project exists but holds no records.
    #[error("project '{project}' has no records")]
    EmptyProject { project: String },

    /// Bad connection string, connection file or argument.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<AccessError> for StoreError {
    fn from(err: AccessError) -> Self {
        StoreError::Access(err)
    }
}

impl StoreError {
    pub fn not_found(project: &str, label: &str) -> Self {
        StoreError::NotFound {
            project: project.to_string(),
            label: label.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// HTTP status carried by an access error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Access(e) => e.status,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_error_display_includes_status_and_body() {
        let err = StoreError::from(AccessError::status("http://h/p/", 500, "boom"));
        let msg = err.to_string();
        assert!(msg.contains("http://h/p/"));
        assert!(msg.contains("500"));
        assert!(msg.contains("boom"));
        assert_eq!(err.status(), Some(500));
        assert_eq!(msg, "error accessing http://h/p/\n500: boom");
    }

    #[test]
    fn network_error_has_no_status() {
        let err = StoreError::from(AccessError::network("http://h/", "connection refused"));
        assert_eq!(err.status(), None);
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "error accessing http://h/\nconnection refused");
    }

    #[test]
    fn not_found_is_distinct() {
        let err = StoreError::not_found("proj", "run1");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "no record labelled 'run1' in project 'proj'");
    }
}
