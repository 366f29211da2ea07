/// Errors raised while building or parsing core provenance types.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A timestamp did not match `YYYY-MM-DD HH:MM:SS`.
    #[error("invalid timestamp '{value}': {message}")]
    InvalidTimestamp { value: String, message: String },

    /// A timestamp could not be rendered.
    #[error("could not format timestamp: {0}")]
    TimestampFormat(String),
}
