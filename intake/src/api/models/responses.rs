use serde::{Deserialize, Serialize};

/// Acknowledgement of a stored submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    /// Id of the stored record
    pub id: i64,
}

impl SubmitResponse {
    pub fn stored(id: i64) -> Self {
        Self { success: true, id }
    }
}

/// Acknowledgement without a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
