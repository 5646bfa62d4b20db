//! Runtime configuration, assembled from command-line arguments and the
//! environment.

use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::TimeDelta;
use thiserror::Error;

use crate::csv::{PartnerFileError, read_partners};
use crate::partner::PartnerDirectory;
use crate::pipeline::Pipeline;
use crate::validation::{DEFAULT_MAX_SKEW_SECS, TransactionValidator};

/// Partner table path, used when no second argument is given.
pub const PARTNERS_VAR: &str = "TRX_GATE_PARTNERS";
/// Tolerated clock skew in seconds.
pub const MAX_SKEW_VAR: &str = "TRX_GATE_MAX_SKEW_SECS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("usage: trx-gate <requests.jsonl> [partners.csv]")]
    MissingInput,

    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),

    #[error("TRX_GATE_MAX_SKEW_SECS must be a whole number of seconds, got '{value}': {source}")]
    InvalidSkew { value: String, source: ParseIntError },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// JSON-lines file of requests.
    pub input: PathBuf,
    /// CSV partner table; the built-in table is used when absent.
    pub partners: Option<PathBuf>,
    pub max_skew: TimeDelta,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_parts(env::args().skip(1), |name| env::var(name).ok())
    }

    /// Build from positional arguments (program name excluded) and a variable lookup.
    pub fn from_parts(
        args: impl IntoIterator<Item = String>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut args = args.into_iter();
        let input = args.next().map(PathBuf::from).ok_or(ConfigError::MissingInput)?;
        let partners = args
            .next()
            .or_else(|| var(PARTNERS_VAR))
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        if let Some(extra) = args.next() {
            return Err(ConfigError::UnexpectedArgument(extra));
        }

        let max_skew = match var(MAX_SKEW_VAR) {
            Some(value) => {
                let secs = value
                    .trim()
                    .parse::<u32>()
                    .map_err(|source| ConfigError::InvalidSkew { value, source })?;
                TimeDelta::seconds(i64::from(secs))
            }
            None => TimeDelta::seconds(DEFAULT_MAX_SKEW_SECS),
        };

        Ok(Self {
            input,
            partners,
            max_skew,
        })
    }

    /// Partner directory from the configured file, or the built-in table.
    pub fn load_directory(&self) -> Result<PartnerDirectory, PartnerFileError> {
        match &self.partners {
            Some(path) => read_partners(path),
            None => Ok(PartnerDirectory::builtin()),
        }
    }

    pub fn build_pipeline(&self, directory: PartnerDirectory) -> Pipeline {
        Pipeline::new(Arc::new(directory)).with_validator(TransactionValidator::new(self.max_skew))
    }
}
