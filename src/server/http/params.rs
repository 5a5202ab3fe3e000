//! Request field helpers shared by the route modules.

use serde::{Deserialize, Deserializer, de::Error as _};

use super::{ApiError, ApiResult, AppState};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

/// Deserialize an optional row id sent either as a JSON number or as a
/// numeric string.
///
/// # Errors
/// Fails when the value is neither, or does not fit in an `i32`.
pub fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Number(n)) => i32::try_from(n).map(Some).map_err(D::Error::custom),
        Some(RawId::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(RawId::Text(s)) => s.trim().parse::<i32>().map(Some).map_err(D::Error::custom),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Deserialize a flag sent as a JSON bool, a number (non-zero is true) or one
/// of `true`/`false`, `yes`/`no`, `on`/`off`, `1`/`0` in any case. `null`, a
/// missing field and the empty string read as `false`.
///
/// # Errors
/// Fails on any other string, or on arrays and objects.
pub fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawFlag>::deserialize(deserializer)? {
        None => Ok(false),
        Some(RawFlag::Bool(b)) => Ok(b),
        Some(RawFlag::Number(n)) => Ok(n.abs() > 0.0),
        Some(RawFlag::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" | "" => Ok(false),
            other => Err(D::Error::custom(format!("'{other}' is not a flag"))),
        },
    }
}

/// Return the trimmed value, or a bad request carrying `message` when it is
/// missing or blank.
pub(crate) fn required<'a>(value: Option<&'a str>, message: &str) -> ApiResult<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(message))
}

/// Reject the request unless `auth` carries the operator secret.
pub(crate) fn require_operator(state: &AppState, auth: Option<&str>) -> ApiResult<()> {
    if state.operator.verify(auth) {
        Ok(())
    } else {
        tracing::debug!(configured = state.operator.is_configured(), "operator check failed");
        Err(ApiError::Forbidden)
    }
}
