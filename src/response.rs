//! Generic JSON response decoding.

use serde::de::DeserializeOwned;

use crate::error::{ApiLinkError, Result};

/// Decode a raw response payload into the caller-declared type.
///
/// The target type parameter is the decode descriptor: it must uniquely
/// determine the shape to decode into, and it is resolved at the call site.
/// The decoder performs structural JSON-to-type mapping only; semantic
/// validation of the decoded value is the caller's responsibility.
///
/// Callers must not hand an empty payload to the decoder; an empty body is
/// a dispatch-level [`EmptyBody`](ApiLinkError::EmptyBody) failure, checked
/// before decoding.
pub fn decode_response<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| ApiLinkError::Decode(e.to_string()))
}
