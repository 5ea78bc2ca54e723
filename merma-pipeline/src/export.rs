//! Donation table export.
//!
//! Identity transform to a CSV byte stream: one row per record, header
//! from the record's field names, dates in ISO form. An empty table
//! serializes to an empty stream.

use thiserror::Error;

use crate::loader::DonationRecord;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize donation row {line}: {source}")]
    Row { line: usize, source: csv::Error },

    #[error("failed to finish CSV stream: {0}")]
    Finish(String),
}

/// Serialize the donation table to CSV bytes, ready to hand to an HTTP
/// response or a file write.
pub fn donations_to_csv(donations: &[DonationRecord]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for (idx, record) in donations.iter().enumerate() {
        writer
            .serialize(record)
            .map_err(|source| ExportError::Row { line: idx + 2, source })?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Finish(e.to_string()))
}
