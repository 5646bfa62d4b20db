use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::partner::{PartnerDirectory, PartnerRecord};

/// Errors that can occur when loading a partner table
#[derive(Debug, Error)]
pub enum PartnerFileError {
    #[error("cannot open partner file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("line {line}: failed to parse partner row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: {field} is empty")]
    Blank { line: usize, field: &'static str },

    #[error("line {line}: duplicate partner {partner_ref_no}")]
    Duplicate { line: usize, partner_ref_no: String },

    #[error("partner file contains no partners")]
    Empty,
}

/// Load a partner table from a csv file with a
/// `partnerrefno,partnerkey,password` header.
pub fn read_partners(path: impl AsRef<Path>) -> Result<PartnerDirectory, PartnerFileError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| PartnerFileError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_partners_from(file)
}

pub fn read_partners_from(input: impl Read) -> Result<PartnerDirectory, PartnerFileError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for (idx, result) in reader.into_deserialize::<PartnerRecord>().enumerate() {
        let line = idx + 2; // 1-indexed, skip header
        let record = result.map_err(|source| PartnerFileError::Parse { line, source })?;

        for (field, value) in [
            ("partnerrefno", &record.partner_ref_no),
            ("partnerkey", &record.partner_key),
            ("password", &record.password),
        ] {
            if value.is_empty() {
                return Err(PartnerFileError::Blank { line, field });
            }
        }

        if !seen.insert(record.partner_ref_no.clone()) {
            return Err(PartnerFileError::Duplicate {
                line,
                partner_ref_no: record.partner_ref_no,
            });
        }
        records.push(record);
    }

    if records.is_empty() {
        return Err(PartnerFileError::Empty);
    }
    Ok(PartnerDirectory::new(records))
}
