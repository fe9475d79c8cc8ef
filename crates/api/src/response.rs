//! API response types.

use serde::Serialize;

/// Acknowledgement response (`{success, message}`).
#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
    pub message: String,
}

impl Ack {
    /// Create a success acknowledgement.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Detail response (`{detail}`).
#[derive(Debug, Serialize)]
pub struct Detail {
    pub detail: String,
}

impl Detail {
    /// Create a detail response.
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
