use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use momo_core::{BuildPolicy, RawMessage, RejectReason, RejectionEntry, TransactionRecord};

use crate::audit::{AuditError, AuditSink};
use crate::config::{ConfigError, EngineConfig};
use crate::extract::FieldExtractor;
use crate::rules::CategoryClassifier;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Audit sink failed at message #{position}: {source}")]
    Audit {
        position: usize,
        #[source]
        source: AuditError,
    },
}

/// What became of one message.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    Accepted(TransactionRecord),
    Rejected(RejectionEntry),
}

/// Accepted records in input order plus every rejection, in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub records: Vec<TransactionRecord>,
    pub rejections: Vec<RejectionEntry>,
}

impl BatchOutcome {
    pub fn report(&self) -> RunReport {
        let mut by_reason = BTreeMap::new();
        for r in &self.rejections {
            *by_reason.entry(r.reason).or_insert(0) += 1;
        }
        let mut by_category = BTreeMap::new();
        for rec in &self.records {
            *by_category.entry(rec.category().to_string()).or_insert(0) += 1;
        }
        RunReport {
            accepted: self.records.len(),
            rejected: self.rejections.len(),
            by_reason,
            by_category,
        }
    }
}

/// Operator-facing counts for a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub accepted: usize,
    pub rejected: usize,
    pub by_reason: BTreeMap<RejectReason, usize>,
    pub by_category: BTreeMap<String, usize>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.accepted + self.rejected
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} messages: {} accepted, {} rejected",
            self.total(),
            self.accepted,
            self.rejected
        )?;
        for (category, count) in &self.by_category {
            writeln!(f, "  {count:>6}  {category}")?;
        }
        for (reason, count) in &self.by_reason {
            writeln!(f, "  {count:>6}  rejected: {}", reason.code())?;
        }
        Ok(())
    }
}

/// Orchestrates: extract → classify → build, one message at a time.
///
/// Holds no per-run state, so one pipeline can process any number of archives.
#[derive(Debug, Clone)]
pub struct SmsPipeline {
    extractor: FieldExtractor,
    classifier: CategoryClassifier,
    policy: BuildPolicy,
}

impl SmsPipeline {
    pub fn new(extractor: FieldExtractor, classifier: CategoryClassifier, policy: BuildPolicy) -> Self {
        Self { extractor, classifier, policy }
    }

    /// Build extractor and classifier from config. The taxonomy file named in
    /// the config is loaded; otherwise the built-in table is used.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        let classifier = match &config.taxonomy_path {
            Some(path) => CategoryClassifier::load(path)?,
            None => CategoryClassifier::builtin(),
        };
        Self::with_classifier(config, classifier)
    }

    pub fn with_classifier(
        config: &EngineConfig,
        classifier: CategoryClassifier,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(
            FieldExtractor::new(config)?,
            classifier,
            BuildPolicy { require_time: config.require_time },
        ))
    }

    pub fn classifier(&self) -> &CategoryClassifier {
        &self.classifier
    }

    /// Decide one message. Never fails: every problem becomes a rejection.
    pub fn process(&self, position: usize, message: &RawMessage) -> Disposition {
        let fields = self.extractor.extract(message);
        let category = self.classifier.classify(&message.body);

        match TransactionRecord::build(message, fields, category.label, self.policy) {
            Ok(record) => {
                tracing::debug!(position, category = category.label, amount = record.amount(), "accepted");
                Disposition::Accepted(record)
            }
            Err(reason) => {
                tracing::debug!(position, reason = reason.code(), "rejected");
                Disposition::Rejected(RejectionEntry::new(position, message, reason))
            }
        }
    }

    /// Process a whole archive in memory.
    pub fn run<I>(&self, messages: I) -> BatchOutcome
    where
        I: IntoIterator<Item = RawMessage>,
    {
        let mut outcome = BatchOutcome::default();
        for (position, message) in messages.into_iter().enumerate() {
            match self.process(position, &message) {
                Disposition::Accepted(record) => outcome.records.push(record),
                Disposition::Rejected(entry) => outcome.rejections.push(entry),
            }
        }
        log_summary(&outcome);
        outcome
    }

    /// Like [`run`](Self::run), but each rejection is appended to `sink` as
    /// soon as it is produced. A sink failure stops the run.
    pub fn run_with_sink<I>(
        &self,
        messages: I,
        sink: &mut dyn AuditSink,
    ) -> Result<BatchOutcome, PipelineError>
    where
        I: IntoIterator<Item = RawMessage>,
    {
        let mut outcome = BatchOutcome::default();
        for (position, message) in messages.into_iter().enumerate() {
            match self.process(position, &message) {
                Disposition::Accepted(record) => outcome.records.push(record),
                Disposition::Rejected(entry) => {
                    tracing::warn!(position, reason = entry.reason.code(), "Unprocessed SMS");
                    sink.append(&entry)
                        .map_err(|source| PipelineError::Audit { position, source })?;
                    outcome.rejections.push(entry);
                }
            }
        }
        log_summary(&outcome);
        Ok(outcome)
    }
}

impl Default for SmsPipeline {
    fn default() -> Self {
        Self::new(
            FieldExtractor::default(),
            CategoryClassifier::builtin(),
            BuildPolicy::default(),
        )
    }
}

fn log_summary(outcome: &BatchOutcome) {
    tracing::info!(
        accepted = outcome.records.len(),
        rejected = outcome.rejections.len(),
        "SMS batch processed"
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────
