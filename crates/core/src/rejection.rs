use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::message::RawMessage;

/// Why a message could not become a [`TransactionRecord`](crate::TransactionRecord).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    #[error("message body is empty")]
    EmptyBody,
    #[error("timestamp is missing or not an epoch-millisecond integer")]
    UnparseableTimestamp,
    #[error("timestamp has no time-of-day component")]
    MissingTime,
    #[error("no RWF-tagged amount in message body")]
    UnparseableAmount,
}

impl RejectReason {
    pub const ALL: [RejectReason; 4] = [
        RejectReason::EmptyBody,
        RejectReason::UnparseableTimestamp,
        RejectReason::MissingTime,
        RejectReason::UnparseableAmount,
    ];

    /// Stable short code used in audit logs.
    pub fn code(self) -> &'static str {
        match self {
            RejectReason::EmptyBody => "empty_body",
            RejectReason::UnparseableTimestamp => "unparseable_timestamp",
            RejectReason::MissingTime => "missing_time",
            RejectReason::UnparseableAmount => "unparseable_amount",
        }
    }
}

impl std::str::FromStr for RejectReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RejectReason::ALL
            .into_iter()
            .find(|r| r.code() == s)
            .ok_or_else(|| format!("Unknown reject reason: '{s}'"))
    }
}

/// Audit-only record of a message that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionEntry {
    /// Zero-based index of the message in its archive.
    pub position: usize,
    pub body: String,
    pub reason: RejectReason,
    pub raw_timestamp: Option<String>,
    pub rejected_at: DateTime<Utc>,
}

impl RejectionEntry {
    pub fn new(position: usize, message: &RawMessage, reason: RejectReason) -> Self {
        Self::at(position, message, reason, Utc::now())
    }

    pub fn at(
        position: usize,
        message: &RawMessage,
        reason: RejectReason,
        rejected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            position,
            body: message.body.clone(),
            reason,
            raw_timestamp: message.timestamp.clone(),
            rejected_at,
        }
    }
}

impl fmt::Display for RejectionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - Unprocessed SMS #{} ({}): {}",
            self.rejected_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.position,
            self.reason.code(),
            self.body
        )
    }
}
