use serde::de::DeserializeOwned;
use serde_json::Value;

/// Errors from the `"type"`-tagged JSON codecs. Unknown discriminators and
/// malformed payloads are programmer errors, not planning outcomes.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Unknown type: {0}")]
    UnknownType(String),
    #[error("missing \"type\" discriminator")]
    MissingType,
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Decode a tagged map after validating its discriminator against the
/// closed list of known names.
pub(crate) fn from_tagged_value<T: DeserializeOwned>(
    value: &Value,
    known_types: &[&str],
) -> Result<T, CodecError> {
    let tag = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingType)?;
    if !known_types.contains(&tag) {
        return Err(CodecError::UnknownType(tag.to_string()));
    }
    Ok(serde_json::from_value(value.clone())?)
}
