//! Wire format for record timestamps.
//!
//! Every backend stores timestamps as `YYYY-MM-DD HH:MM:SS` (no zone, second
//! precision). Sub-second components are dropped when formatting.

use time::macros::format_description;
use time::PrimitiveDateTime;

use crate::error::CoreError;

/// Format a timestamp the way every wire dialect and the local store expect.
pub fn format(ts: &PrimitiveDateTime) -> Result<String, CoreError> {
    ts.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
    .map_err(|e| CoreError::TimestampFormat(e.to_string()))
}

/// Parse a `YYYY-MM-DD HH:MM:SS` timestamp.
pub fn parse(value: &str) -> Result<PrimitiveDateTime, CoreError> {
    PrimitiveDateTime::parse(
        value,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    )
    .map_err(|e| CoreError::InvalidTimestamp {
        value: value.to_string(),
        message: e.to_string(),
    })
}

/// `serde(with = ...)` adapter so records serialize their timestamp as text.
pub mod serde_text {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::PrimitiveDateTime;

    pub fn serialize<S: Serializer>(ts: &PrimitiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        let text = super::format(ts).map_err(serde::ser::Error::custom)?;
        s.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<PrimitiveDateTime, D::Error> {
        let text = String::deserialize(d)?;
        super::parse(&text).map_err(serde::de::Error::custom)
    }
}
