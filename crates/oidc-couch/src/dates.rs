//! Date serialization.
//!
//! Dates are written in UTC with a fixed width
//! (`YYYY-MM-DDTHH:MM:SS.fffffffffZ`) so that string order inside view keys
//! matches chronological order. Any RFC 3339 value is accepted on read.

use serde::{Deserialize, Deserializer, Serializer};
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

const FIXED_WIDTH: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z"
);

/// Formats a timestamp in the stored representation.
///
/// # Errors
///
/// Returns an error for years outside `0000..=9999`.
pub fn format(value: OffsetDateTime) -> Result<String, time::error::Format> {
    value.to_offset(UtcOffset::UTC).format(FIXED_WIDTH)
}

/// Parses an RFC 3339 timestamp.
///
/// # Errors
///
/// Returns an error if `value` is not RFC 3339.
pub fn parse(value: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(value, &Rfc3339)
}

/// `#[serde(with = "crate::dates::option")]` for `Option<OffsetDateTime>`.
pub mod option {
    use super::*;

    pub fn serialize<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => {
                let formatted = format(*value).map_err(serde::ser::Error::custom)?;
                serializer.serialize_some(&formatted)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}
