use crate::error::{HistoryError, Result};
use crate::log::{RECORD_SEPARATOR, RawChunk, RawRecord, RecordReader, decode_record};
use crate::merge::{Accumulator, RunScope};
use crate::model::{DagInfo, build_dag};

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Token separating JSON records in the history file.
    pub separator: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            separator: RECORD_SEPARATOR.to_string(),
        }
    }
}

/// Parser over one history file.
///
/// Holds no per-parse state; every [`HistoryParser::dag_data`] call makes
/// its own bounded pass over the file.
#[derive(Debug, Clone)]
pub struct HistoryParser {
    path: PathBuf,
    options: ParseOptions,
}

impl HistoryParser {
    pub fn new(path: impl Into<PathBuf>, options: ParseOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rebuild the DAG identified by `run_id` from the history file.
    pub fn dag_data(&self, run_id: &str) -> Result<DagInfo> {
        let scope = RunScope::new(run_id)?;
        if self.options.separator.is_empty() {
            return Err(HistoryError::InvalidArgument(
                "record separator cannot be empty".to_string(),
            ));
        }
        if !self.path.exists() {
            return Err(HistoryError::InvalidArgument(format!(
                "{} does not exist",
                self.path.display()
            )));
        }

        // The handle is dropped when this scope ends, on every path.
        let file = File::open(&self.path).map_err(|e| HistoryError::io(&self.path, e))?;
        let reader = RecordReader::new(BufReader::new(file), &self.options.separator);

        let acc = reader
            .map(|chunk| self.decode(chunk))
            .try_fold(Accumulator::new(scope), |acc, record| acc.absorb(record?))?;

        build_dag(acc.finish())
    }

    fn decode(&self, chunk: io::Result<RawChunk>) -> Result<RawRecord> {
        let chunk = chunk.map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => {
                HistoryError::malformed(format!("record is not valid UTF-8: {e}"))
            }
            _ => HistoryError::io(&self.path, e),
        })?;
        decode_record(&chunk)
    }
}

/// Parse `path` with default options and return the DAG for `run_id`.
pub fn parse(path: impl AsRef<Path>, run_id: &str) -> Result<DagInfo> {
    HistoryParser::new(path.as_ref(), ParseOptions::default()).dag_data(run_id)
}
