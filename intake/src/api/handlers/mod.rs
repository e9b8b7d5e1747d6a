//! HTTP request handlers for all API endpoints.
//!
//! # Handler Modules
//!
//! - [`leads`]: lead submission, listing and deletion
//! - [`submissions`]: diagnosis submission (JSON or multipart), listing and deletion
//! - [`telegram`]: notification settings and test message
//! - [`static_assets`]: static file serving for every non-API path
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Result`], which renders failures as
//! `{"error": "<message>"}` with the matching status code.

pub mod leads;
pub mod static_assets;
pub mod submissions;
pub mod telegram;

use serde_json::{Map, Value};

use crate::errors::{Error, Result};

/// Parse a request body that must be a JSON object.
pub(crate) fn parse_json_object(body: &[u8]) -> Result<Map<String, Value>> {
    match serde_json::from_slice(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(Error::bad_request("Expected a JSON object")),
        Err(e) => Err(Error::bad_request(format!("Invalid JSON: {e}"))),
    }
}

/// Parse a path id. Anything that is not an integer matches no record.
pub(crate) fn parse_record_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}
