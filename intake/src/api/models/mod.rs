//! API response bodies.
//!
//! Stored records are returned as-is from [`crate::storage`]; the types here only describe
//! acknowledgements.

pub mod responses;

pub use responses::{SubmitResponse, SuccessResponse};
