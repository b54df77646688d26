use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::message::RawMessage;
use super::rejection::RejectReason;

/// Fields pulled out of one message body and its timestamp.
/// Every field is optional; the builder decides what is fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    /// Whole currency units (RWF has no minor unit).
    pub amount: Option<i64>,
    pub transaction_id: Option<String>,
    pub date: Option<NaiveDate>,
    /// Wall-clock time truncated to the second.
    pub time: Option<NaiveTime>,
}

/// Acceptance rules applied by [`TransactionRecord::build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPolicy {
    /// When false, a message with a date but no time is still recorded.
    pub require_time: bool,
}

impl Default for BuildPolicy {
    fn default() -> Self {
        Self { require_time: true }
    }
}

/// A categorised mobile-money transaction. Only constructible through
/// [`TransactionRecord::build`]; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    category: String,
    date: NaiveDate,
    time: Option<NaiveTime>,
    amount: i64,
    transaction_id: Option<String>,
    body: String,
}

impl TransactionRecord {
    /// Accept or reject one message. The first failing check wins, in the
    /// order body, date, time, amount.
    pub fn build(
        message: &RawMessage,
        fields: ExtractedFields,
        category: &str,
        policy: BuildPolicy,
    ) -> Result<TransactionRecord, RejectReason> {
        if !message.has_body() {
            return Err(RejectReason::EmptyBody);
        }

        let date = fields.date.ok_or(RejectReason::UnparseableTimestamp)?;

        if policy.require_time && fields.time.is_none() {
            return Err(RejectReason::MissingTime);
        }

        let amount = fields.amount.ok_or(RejectReason::UnparseableAmount)?;

        Ok(TransactionRecord {
            category: category.to_string(),
            date,
            time: fields.time,
            amount,
            transaction_id: fields.transaction_id,
            body: message.body.clone(),
        })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time(&self) -> Option<NaiveTime> {
        self.time
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}
