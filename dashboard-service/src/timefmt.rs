//! serde adapters for the canonical timestamp text (`2025-01-01 08:00:00`).

use meter_core::domain::timestamp;
use serde::{de::Error as _, Deserialize as _, Deserializer, Serializer};
use time::PrimitiveDateTime;

pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<PrimitiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    timestamp::parse_timestamp(&s).map_err(D::Error::custom)
}

pub fn serialize_timestamp<S>(t: &PrimitiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&timestamp::format_timestamp(*t))
}
