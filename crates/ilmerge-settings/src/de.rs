//! Lenient field decoders for hand-written configuration files.

use serde::{Deserialize, Deserializer};

/// Reads `null` as the type's default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagText {
    Bool(bool),
    Text(String),
}

/// Reads a text field that older files store as a JSON boolean.
pub(crate) fn flag_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<FlagText>::deserialize(deserializer)? {
        Some(FlagText::Bool(b)) => Some(b.to_string()),
        Some(FlagText::Text(s)) => Some(s),
        None => None,
    })
}
