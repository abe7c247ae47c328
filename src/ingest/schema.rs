//! Column mapping from data-logger exports to canonical fields.

use csv::StringRecord;

use super::IngestError;
use crate::domain::{Channel, RAW_TIMESTAMP_COLUMN, TIMESTAMP_FIELD};

/// Canonical target of a recognised source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Timestamp,
    Channel(Channel),
}

/// Raw column name → canonical field, one entry per recognised column.
pub fn column_mappings() -> Vec<(&'static str, Field)> {
    std::iter::once((RAW_TIMESTAMP_COLUMN, Field::Timestamp))
        .chain(Channel::all().map(|c| (c.raw_column(), Field::Channel(c))))
        .collect()
}

/// Resolve a single header cell. Canonical names are accepted as well so that
/// exported tables can be re-imported.
pub fn resolve_column(header: &str) -> Option<Field> {
    let header = header.trim();
    if header == RAW_TIMESTAMP_COLUMN || header == TIMESTAMP_FIELD {
        return Some(Field::Timestamp);
    }
    Channel::all()
        .find(|c| c.raw_column() == header || c.name() == header)
        .map(Field::Channel)
}

/// Positions of the recognised columns inside one source file.
#[derive(Debug, Clone)]
pub struct HeaderLayout {
    pub timestamp: usize,
    pub channels: Vec<(usize, Channel)>,
}

impl HeaderLayout {
    /// Build the layout for `headers`, dropping unknown columns.
    ///
    /// Fails when the timestamp or any required channel is absent.
    pub fn from_headers(headers: &StringRecord, source: &str) -> Result<Self, IngestError> {
        let mut timestamp = None;
        let mut channels: Vec<(usize, Channel)> = Vec::new();

        for (idx, header) in headers.iter().enumerate() {
            match resolve_column(header) {
                Some(Field::Timestamp) if timestamp.is_none() => timestamp = Some(idx),
                Some(Field::Channel(ch)) if !channels.iter().any(|(_, c)| *c == ch) => {
                    channels.push((idx, ch))
                }
                Some(_) => {
                    tracing::debug!(source, column = header, "duplicate column ignored");
                }
                None => {}
            }
        }

        let mut missing: Vec<&'static str> = Vec::new();
        if timestamp.is_none() {
            missing.push(TIMESTAMP_FIELD);
        }
        missing.extend(
            Channel::all()
                .filter(|c| c.is_required() && !channels.iter().any(|(_, have)| have == c))
                .map(Channel::name),
        );

        match timestamp {
            Some(timestamp) if missing.is_empty() => Ok(Self { timestamp, channels }),
            _ => Err(IngestError::MissingColumns {
                source_name: source.to_string(),
                columns: missing,
            }),
        }
    }
}
