//! Bearer-token extraction from inbound request headers.

use crate::error::ApiError;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

/// Extract the caller's bearer token, if any.
///
/// An absent header means anonymous access and yields `Ok(None)`. A present
/// header must carry a `Bearer ` prefix (case-insensitive); anything else is
/// rejected as `Unauthorized`.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| ApiError::Unauthorized)?;
    let (scheme, token) = value.split_once(' ').ok_or(ApiError::Unauthorized)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApiError::Unauthorized);
    }
    Ok(Some(token.to_string()))
}
