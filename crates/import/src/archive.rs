use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;
use thiserror::Error;

use momo_core::RawMessage;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed SMS archive: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Malformed attribute on <sms>: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),
}

/// Reader for "SMS Backup & Restore" style XML exports:
///
/// ```xml
/// <smses count="2">
///   <sms date="1700000000000" body="You have received 2,000 RWF ..." />
///   <sms date="1700000100000" body="..." />
/// </smses>
/// ```
///
/// Only `<sms>` elements are read, in document order. Missing `body` becomes an
/// empty string and missing `date` becomes `None`; judging those is the
/// pipeline's job, not the reader's.
pub struct SmsArchiveParser;

impl SmsArchiveParser {
    pub fn parse(data: &str) -> Result<Vec<RawMessage>, ArchiveError> {
        let mut reader = Reader::from_str(data);
        let mut messages = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"sms" => {
                    messages.push(read_sms(&e)?);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(messages)
    }
}

fn read_sms(e: &BytesStart<'_>) -> Result<RawMessage, ArchiveError> {
    let mut body = None;
    let mut timestamp = None;

    for attr in e.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"body" => body = Some(attr.unescape_value()?.into_owned()),
            b"date" => timestamp = Some(attr.unescape_value()?.into_owned()),
            _ => {}
        }
    }

    Ok(RawMessage::new(body.unwrap_or_default(), timestamp))
}

pub fn parse(data: &[u8]) -> Result<Vec<RawMessage>, ArchiveError> {
    let content = String::from_utf8_lossy(data);
    SmsArchiveParser::parse(&content)
}

pub fn load(path: &Path) -> Result<Vec<RawMessage>, ArchiveError> {
    let data = std::fs::read(path)?;
    parse(&data)
}
