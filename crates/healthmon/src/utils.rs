use serde::{Deserialize, Deserializer, de::Error};

/// Beacon API quantities are decimal strings.
pub(crate) fn deserialize_string_to_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<u64>().map_err(D::Error::custom)
}

pub(crate) fn deserialize_opt_string_to_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|s| s.parse::<u64>().map_err(D::Error::custom))
        .transpose()
}
