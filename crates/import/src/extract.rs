use chrono::{DateTime, NaiveDateTime, Timelike};
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

use momo_core::{ExtractedFields, RawMessage};

use crate::config::{ConfigError, EngineConfig, TimeBasis};

/// Pulls amount, transaction id, date and time out of one message.
///
/// Patterns are compiled once from the configured markers, so a single
/// extractor should be reused for a whole archive.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    amount: Regex,
    transaction_id: Option<Regex>,
    time_basis: TimeBasis,
}

impl FieldExtractor {
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        let marker = config.currency_marker.trim();
        if marker.is_empty() {
            return Err(ConfigError::EmptyCurrencyMarker);
        }
        // Digits, optionally split by `,`/`.` groups, then the marker.
        let amount = Regex::new(&format!(
            r"(\d+(?:[,.]\d+)*)\s?{}",
            regex::escape(marker)
        ))?;

        let markers: Vec<String> = config
            .transaction_id_markers
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(regex::escape)
            .collect();
        let transaction_id = if markers.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(r"(?:{})[:\s]*(\d+)", markers.join("|")))?)
        };

        Ok(Self {
            amount,
            transaction_id,
            time_basis: config.time_basis,
        })
    }

    pub fn extract(&self, message: &RawMessage) -> ExtractedFields {
        let timestamp = message
            .timestamp
            .as_deref()
            .and_then(|raw| convert_timestamp(raw, self.time_basis));

        ExtractedFields {
            amount: self.extract_amount(&message.body),
            transaction_id: self.extract_transaction_id(&message.body),
            date: timestamp.map(|dt| dt.date()),
            time: timestamp.map(|dt| dt.time()),
        }
    }

    /// First currency-tagged numeral in the body, in whole units.
    pub fn extract_amount(&self, body: &str) -> Option<i64> {
        let c = self.amount.captures(body)?;
        parse_amount_str(c.get(1)?.as_str())
    }

    pub fn extract_transaction_id(&self, body: &str) -> Option<String> {
        let c = self.transaction_id.as_ref()?.captures(body)?;
        Some(c.get(1)?.as_str().to_string())
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new(&EngineConfig::default()).expect("default extraction patterns compile")
    }
}

/// Epoch milliseconds → wall-clock date and time, truncated to the second.
/// `None` for anything that is not an in-range integer.
pub fn convert_timestamp(raw: &str, basis: TimeBasis) -> Option<NaiveDateTime> {
    let millis: i64 = raw.trim().parse().ok()?;
    let instant = DateTime::from_timestamp_millis(millis)?;
    basis.localize(instant).with_nanosecond(0)
}

// ── Amount parsing ────────────────────────────────────────────────────────────

/// Commas are grouping separators. A single dot is a decimal point and the
/// fraction is dropped; several dots are read as grouping (`1.250.000`).
fn parse_amount_str(s: &str) -> Option<i64> {
    let mut clean = s.replace(',', "");
    if clean.matches('.').count() > 1 {
        clean = clean.replace('.', "");
    }
    let dec = Decimal::from_str(&clean).ok()?;
    dec.trunc().to_i64()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
