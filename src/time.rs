use chrono::{DateTime, SecondsFormat, Utc};

/// UTC timestamp as ISO-8601 / RFC3339 with a `Z` suffix.
pub fn to_iso8601_utc_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
