pub mod archive;
pub mod audit;
pub mod config;
pub mod extract;
pub mod pipeline;
pub mod rules;

pub use archive::{ArchiveError, SmsArchiveParser};
pub use audit::{AuditError, AuditFormat, AuditSink, LogAuditSink, MemoryAuditSink};
pub use config::{ConfigError, EngineConfig, TimeBasis};
pub use extract::{convert_timestamp, FieldExtractor};
pub use pipeline::{BatchOutcome, Disposition, PipelineError, RunReport, SmsPipeline};
pub use rules::{CategoryClassifier, CategoryRule, Classification, Taxonomy, TaxonomyError};

pub mod import {
    use crate::*;
    use momo_core::RawMessage;
    use std::path::Path;

    pub fn load_archive(path: &Path) -> Result<Vec<RawMessage>, ArchiveError> {
        crate::archive::load(path)
    }

    pub fn create_pipeline(config: &EngineConfig) -> Result<SmsPipeline, ConfigError> {
        SmsPipeline::from_config(config)
    }

    /// Parse an in-memory XML export and run it through the default pipeline.
    pub fn run_archive(xml: &[u8]) -> Result<BatchOutcome, ArchiveError> {
        let messages = crate::archive::parse(xml)?;
        Ok(SmsPipeline::default().run(messages))
    }
}
