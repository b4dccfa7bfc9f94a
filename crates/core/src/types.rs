/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Pallets are identified by an opaque string such as `PALLET_001`.
pub type PalletId = String;

/// Serde helpers for incoming timestamps.
///
/// Accepts RFC 3339 as well as ISO-8601 without an offset
/// (`2023-10-05T12:00:00.123456`), which is read as UTC. Serialization is
/// left to chrono's RFC 3339 default.
pub mod lenient_timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    use super::Timestamp;

    pub fn parse(raw: &str) -> Result<Timestamp, chrono::ParseError> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| raw.parse::<NaiveDateTime>().map(|naive| naive.and_utc()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(D::Error::custom)
    }

    /// For `Option<Timestamp>` fields; pair with `#[serde(default)]`.
    pub fn deserialize_option<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Timestamp>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse(&raw).map_err(D::Error::custom))
            .transpose()
    }
}
