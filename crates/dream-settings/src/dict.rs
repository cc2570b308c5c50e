//! Helpers for reading the solver's dictionary layout.

use dream_types::error::{DreamError, DreamResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Read a mandatory field of a settings dictionary.
pub fn field<T: DeserializeOwned>(data: &Value, key: &str, module: &'static str) -> DreamResult<T> {
    let raw = data
        .get(key)
        .ok_or_else(|| DreamError::equation(module, format!("Missing mandatory setting '{key}'.")))?;
    serde_json::from_value(raw.clone()).map_err(|e| {
        DreamError::equation(module, format!("Invalid value assigned to '{key}': {e}"))
    })
}

/// Read an optional field; a missing key or explicit `null` yields `None`.
pub fn optional_field<T: DeserializeOwned>(
    data: &Value,
    key: &str,
    module: &'static str,
) -> DreamResult<Option<T>> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => field(data, key, module).map(Some),
    }
}
