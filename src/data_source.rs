//! Loader and writer abstractions around the file container
//!
//! The pipeline only sees these two traits, so any container (NetCDF on disk,
//! an in-memory store for tests) can feed it and receive its output.

use crate::dataset::Dataset;
use crate::errors::{NpcpError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Reads a whole dataset from a location
pub trait DatasetReader {
    fn read_dataset(&self, path: &Path) -> Result<Dataset>;
}

/// Writes a whole dataset to a location.
///
/// Implementations must not leave a partial file behind on failure.
pub trait DatasetWriter {
    fn write_dataset(&self, dataset: &Dataset, path: &Path) -> Result<()>;
}

/// Dataset store kept entirely in memory, keyed by path
#[derive(Debug, Default)]
pub struct MemoryStore {
    datasets: Mutex<HashMap<PathBuf, Dataset>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(self, path: impl Into<PathBuf>, dataset: Dataset) -> Self {
        self.put(path, dataset);
        self
    }

    pub fn put(&self, path: impl Into<PathBuf>, dataset: Dataset) {
        self.datasets().insert(path.into(), dataset);
    }

    /// A copy of the dataset stored at `path`, if any
    pub fn get(&self, path: &Path) -> Option<Dataset> {
        self.datasets().get(path).cloned()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.datasets().contains_key(path)
    }

    // A panic elsewhere never leaves a half-inserted entry, so a poisoned map
    // is still consistent.
    fn datasets(&self) -> MutexGuard<'_, HashMap<PathBuf, Dataset>> {
        self.datasets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DatasetReader for MemoryStore {
    fn read_dataset(&self, path: &Path) -> Result<Dataset> {
        self.get(path).ok_or_else(|| {
            NpcpError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no dataset at {}", path.display()),
            ))
        })
    }
}

impl DatasetWriter for MemoryStore {
    fn write_dataset(&self, dataset: &Dataset, path: &Path) -> Result<()> {
        self.put(path, dataset.clone());
        Ok(())
    }
}
