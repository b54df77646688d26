use anyhow::{Context, Result};
use momo_import::{
    import, AuditFormat, BatchOutcome, CategoryClassifier, EngineConfig, LogAuditSink, TimeBasis,
};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// Options shared by every subcommand.
#[derive(Debug, Default)]
pub struct Settings {
    pub config: Option<PathBuf>,
    pub categories: Option<PathBuf>,
}

impl Settings {
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => EngineConfig::default(),
        };
        if let Some(path) = &self.categories {
            config.taxonomy_path = Some(path.clone());
        }
        Ok(config)
    }

    pub fn classifier(&self) -> Result<CategoryClassifier> {
        let config = self.engine_config()?;
        match &config.taxonomy_path {
            Some(path) => CategoryClassifier::load(path)
                .with_context(|| format!("loading categories {}", path.display())),
            None => Ok(CategoryClassifier::builtin()),
        }
    }
}

#[derive(Debug)]
pub struct ExtractArgs {
    pub archive: PathBuf,
    pub output: Option<PathBuf>,
    pub audit_log: PathBuf,
    pub audit_format: String,
    pub timezone: Option<String>,
}

pub fn extract(settings: &Settings, args: &ExtractArgs) -> Result<()> {
    let outcome = run_extract(settings, args)?;

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating output {}", path.display()))?;
            write_records(BufWriter::new(file), &outcome)?;
            tracing::info!("Records written to {}", path.display());
        }
        None => write_records(io::stdout().lock(), &outcome)?,
    }

    eprint!("{}", outcome.report());
    Ok(())
}

fn run_extract(settings: &Settings, args: &ExtractArgs) -> Result<BatchOutcome> {
    let mut config = settings.engine_config()?;
    if let Some(tz) = &args.timezone {
        config.time_basis = tz.parse::<TimeBasis>()?;
    }
    let pipeline = import::create_pipeline(&config).context("building pipeline")?;

    let format: AuditFormat = args.audit_format.parse().map_err(anyhow::Error::msg)?;
    let mut sink = LogAuditSink::open(&args.audit_log, format)
        .with_context(|| format!("opening audit log {}", args.audit_log.display()))?;

    let messages = import::load_archive(&args.archive)
        .with_context(|| format!("reading archive {}", args.archive.display()))?;
    tracing::info!("Loaded {} messages from {}", messages.len(), args.archive.display());

    let outcome = pipeline.run_with_sink(messages, &mut sink)?;
    Ok(outcome)
}

fn write_records<W: Write>(mut out: W, outcome: &BatchOutcome) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, &outcome.records)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

pub fn classify(settings: &Settings, body: &str) -> Result<()> {
    let classifier = settings.classifier()?;
    write_classification(io::stdout().lock(), &classifier, body)
}

fn write_classification<W: Write>(
    mut out: W,
    classifier: &CategoryClassifier,
    body: &str,
) -> Result<()> {
    let got = classifier.classify(body);
    if got.is_fallback() {
        writeln!(out, "{} (no rule matched)", got.label)?;
    } else {
        writeln!(out, "{}", got.label)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct CategoryListing<'a> {
    position: usize,
    name: &'a str,
    triggers: &'a [String],
}

pub fn categories(settings: &Settings, json: bool) -> Result<()> {
    let classifier = settings.classifier()?;
    write_categories(io::stdout().lock(), &classifier, json)
}

fn write_categories<W: Write>(mut out: W, classifier: &CategoryClassifier, json: bool) -> Result<()> {
    if json {
        let listing: Vec<CategoryListing<'_>> = classifier
            .rules()
            .iter()
            .enumerate()
            .map(|(idx, rule)| CategoryListing {
                position: idx + 1,
                name: &rule.name,
                triggers: &rule.triggers,
            })
            .collect();
        serde_json::to_writer_pretty(&mut out, &listing)?;
        writeln!(out)?;
        return Ok(());
    }

    for (idx, rule) in classifier.rules().iter().enumerate() {
        writeln!(out, "{:>2}. {} <- {}", idx + 1, rule.name, quoted(&rule.triggers))?;
    }
    writeln!(out, "    fallback: {}", classifier.fallback())?;
    Ok(())
}

fn quoted(triggers: &[String]) -> String {
    triggers
        .iter()
        .map(|t| format!("\"{t}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use momo_core::RejectReason;
    use std::path::Path;

    const ARCHIVE: &str = r#"<smses count="3">
  <sms date="1700000000000" body="You have received 2,000 RWF from John. TxId: 12345." />
  <sms date="1700000060000" body="Your PIN was changed." />
  <sms date="1700000120000" body="Your airtime purchase of 500 RWF was successful." />
</smses>"#;

    fn extract_args(dir: &Path) -> ExtractArgs {
        let archive = dir.join("sms.xml");
        std::fs::write(&archive, ARCHIVE).unwrap();
        ExtractArgs {
            archive,
            output: Some(dir.join("records.json")),
            audit_log: dir.join("unprocessed_sms.log"),
            audit_format: "text".to_string(),
            timezone: Some("utc".to_string()),
        }
    }

    // ── extract ───────────────────────────────────────────────────────────────

    #[test]
    fn extract_writes_records_and_audit_log() {
        let dir = tempfile::tempdir().unwrap();
        let args = extract_args(dir.path());

        extract(&Settings::default(), &args).unwrap();

        let records: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("records.json")).unwrap())
                .unwrap();
        let records = records.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["category"], "Incoming Money");
        assert_eq!(records[0]["date"], "2023-11-14");
        assert_eq!(records[0]["time"], "22:13:20");
        assert_eq!(records[1]["category"], "Airtime Bill Payments");
        assert_eq!(records[1]["amount"], 500);

        let audit = std::fs::read_to_string(&args.audit_log).unwrap();
        assert_eq!(audit.lines().count(), 1);
        assert!(audit.contains("Unprocessed SMS #1 (unparseable_amount): Your PIN was changed."));
    }

    #[test]
    fn extract_json_audit_format() {
        let dir = tempfile::tempdir().unwrap();
        let args = ExtractArgs {
            audit_format: "json".to_string(),
            ..extract_args(dir.path())
        };
        let outcome = run_extract(&Settings::default(), &args).unwrap();
        assert_eq!(outcome.rejections.len(), 1);

        let audit = std::fs::read_to_string(&args.audit_log).unwrap();
        let entry: momo_core::RejectionEntry = serde_json::from_str(audit.trim_end()).unwrap();
        assert_eq!(entry.reason, RejectReason::UnparseableAmount);
        assert_eq!(entry.position, 1);
    }

    #[test]
    fn extract_rejects_unknown_audit_format() {
        let dir = tempfile::tempdir().unwrap();
        let args = ExtractArgs {
            audit_format: "yaml".to_string(),
            ..extract_args(dir.path())
        };
        assert!(run_extract(&Settings::default(), &args).is_err());
    }

    #[test]
    fn extract_bad_timezone_errors() {
        let dir = tempfile::tempdir().unwrap();
        let args = ExtractArgs {
            timezone: Some("Mars/Olympus".to_string()),
            ..extract_args(dir.path())
        };
        assert!(run_extract(&Settings::default(), &args).is_err());
    }

    #[test]
    fn extract_missing_archive_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let args = ExtractArgs {
            archive: dir.path().join("absent.xml"),
            ..extract_args(dir.path())
        };
        let err = run_extract(&Settings::default(), &args).unwrap_err();
        assert!(format!("{err:#}").contains("absent.xml"));
    }

    #[test]
    fn extract_honours_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("categories.toml"),
            "fallback = \"Other\"\n[[category]]\nname = \"Airtime\"\ntriggers = [\"airtime\"]\n",
        )
        .unwrap();
        let config_path = dir.path().join("momo.toml");
        std::fs::write(&config_path, "taxonomy_path = \"categories.toml\"\ntime_basis = \"+02:00\"\n")
            .unwrap();

        let settings = Settings { config: Some(config_path), categories: None };
        let args = ExtractArgs { timezone: None, ..extract_args(dir.path()) };
        let outcome = run_extract(&settings, &args).unwrap();

        let cats: Vec<&str> = outcome.records.iter().map(|r| r.category()).collect();
        assert_eq!(cats, ["Other", "Airtime"]);
        // 22:13:20Z rendered at +02:00 rolls over to the next day.
        assert_eq!(outcome.records[0].date().to_string(), "2023-11-15");
    }

    // ── classify / categories ─────────────────────────────────────────────────

    #[test]
    fn classify_prints_label() {
        let mut out = Vec::new();
        write_classification(&mut out, &CategoryClassifier::builtin(), "You have received 1 RWF")
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Incoming Money\n");
    }

    #[test]
    fn classify_marks_fallback() {
        let mut out = Vec::new();
        write_classification(&mut out, &CategoryClassifier::builtin(), "Your PIN was changed.")
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Text to ignore (no rule matched)\n");
    }

    #[test]
    fn categories_plain_listing() {
        let mut out = Vec::new();
        write_categories(&mut out, &CategoryClassifier::builtin(), false).unwrap();
        let text = String::from_utf8(out).unwrap();
        let first = text.lines().next().unwrap();
        assert_eq!(first, " 1. Incoming Money <- \"received\"");
        assert!(text.ends_with("    fallback: Text to ignore\n"));
    }

    #[test]
    fn categories_json_listing() {
        let mut out = Vec::new();
        write_categories(&mut out, &CategoryClassifier::builtin(), true).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(v.as_array().unwrap().len(), 10);
        assert_eq!(v[4]["name"], "Airtime Bill Payments");
        assert_eq!(v[4]["position"], 5);
    }

    #[test]
    fn categories_flag_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.toml");
        std::fs::write(&path, "fallback = \"F\"\n[[category]]\nname = \"Only\"\ntriggers = [\"x\"]\n")
            .unwrap();
        let settings = Settings { config: None, categories: Some(path) };
        let c = settings.classifier().unwrap();
        assert_eq!(c.rules().len(), 1);
        assert_eq!(c.fallback(), "F");
    }
}
