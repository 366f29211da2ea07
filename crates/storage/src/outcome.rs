use tracing::warn;

/// Result of an operation a backend may refuse by policy.
///
/// Managed remote services do not let clients bulk-delete or wipe data.
/// Those refusals are not failures: the caller gets `Unsupported` and can
/// branch on it without parsing warning text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Done(T),
    Unsupported {
        operation: &'static str,
        reason: String,
    },
}

impl<T> Outcome<T> {
    /// Build an `Unsupported` outcome and emit the matching warning.
    pub fn unsupported(operation: &'static str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!(operation, "{}", reason);
        Outcome::Unsupported { operation, reason }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Outcome::Unsupported { .. })
    }

    /// The value, or `fallback` when the operation was refused.
    pub fn unwrap_or(self, fallback: T) -> T {
        match self {
            Outcome::Done(v) => v,
            Outcome::Unsupported { .. } => fallback,
        }
    }
}

impl Outcome<usize> {
    /// Number of records affected; zero when the backend refused.
    pub fn count(&self) -> usize {
        match self {
            Outcome::Done(n) => *n,
            Outcome::Unsupported { .. } => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_count_is_zero() {
        let o: Outcome<usize> = Outcome::unsupported("delete_by_tag", "not allowed");
        assert!(o.is_unsupported());
        assert_eq!(o.count(), 0);
    }

    #[test]
    fn done_count_passes_through() {
        assert_eq!(Outcome::Done(3usize).count(), 3);
        assert_eq!(Outcome::Done(3usize).unwrap_or(0), 3);
    }
}
