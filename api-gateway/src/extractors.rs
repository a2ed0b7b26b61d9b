//! JSON extraction and request validation.

use axum::Json;
use axum::extract::rejection::JsonRejection;

use crate::error::AppError;

/// Business-rule checks that run after a body deserializes.
pub trait Validate {
    /// Returns the client-facing error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Unwraps a JSON body, turning rejections into 400s.
///
/// Handlers take `Result<Json<T>, JsonRejection>` so that a malformed
/// body produces `{"error": ...}` instead of axum's plain-text rejection.
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::Validation(err.body_text()))
}

pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// JavaScript-style truthiness of an optional JSON value.
pub fn is_present(value: &Option<serde_json::Value>) -> bool {
    value.as_ref().is_some_and(is_truthy)
}

/// JavaScript-style truthiness: `null`, `false`, `0` and `""` are falsy.
pub fn is_truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;

    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => true,
    }
}
