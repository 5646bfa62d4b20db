//! JSON-lines input and output: one request per input line, one response
//! per output line.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::model::{Submission, TransactionRequest, TransactionResponse};
use crate::redact;

#[derive(Debug, Error)]
pub enum JsonlError {
    #[error("cannot open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("line {line}: read failed: {source}")]
    Read { line: usize, source: io::Error },

    #[error("line {line}: failed to decode request: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },

    #[error("failed to write response: {0}")]
    Write(#[from] io::Error),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl JsonlError {
    /// Input line a per-line failure refers to; `None` for stream-level failures.
    pub fn line(&self) -> Option<usize> {
        match self {
            JsonlError::Read { line, .. } | JsonlError::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Read submissions from a JSON-lines file. The iterator owns the file and
/// does not borrow `path`.
pub fn read_submissions(
    path: &Path,
) -> Result<impl Iterator<Item = Result<Submission, JsonlError>> + use<>, JsonlError> {
    let file = File::open(path).map_err(|source| JsonlError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_submissions(BufReader::new(file)))
}

/// Decode submissions from any buffered reader. Blank lines are skipped;
/// a literal `null` line is an absent request.
pub fn parse_submissions(
    input: impl BufRead,
) -> impl Iterator<Item = Result<Submission, JsonlError>> {
    input
        .lines()
        .enumerate()
        .filter_map(|(idx, result)| {
            let line = idx + 1;
            let raw = match result {
                Ok(raw) => raw,
                Err(source) => return Some(Err(JsonlError::Read { line, source })),
            };
            if raw.trim().is_empty() {
                return None;
            }

            let decoded = serde_json::from_str::<Option<TransactionRequest>>(&raw)
                .map(|request| Submission { line, request })
                .map_err(|source| {
                    debug!(line, body = %redact::masked_body(&raw), "undecodable request line");
                    JsonlError::Parse { line, source }
                });
            Some(decoded)
        })
}

/// Write one JSON response per line
pub fn write_responses<'a>(
    responses: impl IntoIterator<Item = &'a TransactionResponse>,
    mut output: impl Write,
) -> Result<(), JsonlError> {
    for response in responses {
        serde_json::to_writer(&mut output, response)?;
        output.write_all(b"\n")?;
    }
    output.flush()?;
    Ok(())
}
