use serde::{Deserialize, Serialize};

/// One SMS notification as found in the archive.
///
/// Both attributes may be missing in the source document. An absent body is
/// stored as an empty string; an absent timestamp as `None`. The timestamp is
/// kept as raw text so that malformed values survive into the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub body: String,
    /// Epoch milliseconds, exactly as written in the archive.
    pub timestamp: Option<String>,
}

impl RawMessage {
    pub fn new(body: impl Into<String>, timestamp: Option<String>) -> Self {
        Self { body: body.into(), timestamp }
    }

    pub fn from_millis(body: impl Into<String>, millis: i64) -> Self {
        Self::new(body, Some(millis.to_string()))
    }

    pub fn without_timestamp(body: impl Into<String>) -> Self {
        Self::new(body, None)
    }

    /// Whether the body carries any non-whitespace text.
    pub fn has_body(&self) -> bool {
        !self.body.trim().is_empty()
    }
}
