//! Command-line provenance for the `history` attribute
//!
//! The log records the current invocation with a timestamp and, for each input
//! file that carried a history of its own, a block keyed by that file's path:
//!
//! ```text
//! Sat Oct 17 09:12:44 2026: npcp-prep in.nc tmax out.nc
//!
//! History of in.nc:
//! created by source pipeline v1
//! ```

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// A new history entry plus the prior histories of its input files
#[derive(Debug, Clone, PartialEq)]
pub struct ProvenanceLog {
    pub timestamp: DateTime<Utc>,
    pub command: String,
    pub infile_logs: BTreeMap<String, String>,
}

impl ProvenanceLog {
    /// Start a log for `command`, stamped now
    pub fn new(command: impl Into<String>) -> Self {
        Self::at(command, Utc::now())
    }

    pub fn at(command: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            command: command.into(),
            infile_logs: BTreeMap::new(),
        }
    }

    /// Nest an input file's prior history under its path
    #[must_use]
    pub fn with_infile_log(mut self, path: impl Into<String>, history: impl Into<String>) -> Self {
        self.infile_logs.insert(path.into(), history.into());
        self
    }
}

impl fmt::Display for ProvenanceLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}",
            self.timestamp.format("%a %b %d %H:%M:%S %Y"),
            self.command
        )?;
        for (path, history) in &self.infile_logs {
            write!(f, "\n\nHistory of {path}:\n{history}")?;
        }
        Ok(())
    }
}
