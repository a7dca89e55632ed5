use chrono::{DateTime, Local};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::reader::LogFileReader;
use logscope_types::LogRecord;

/// One physical log file, parsed lazily and at most once
pub struct RecordSource {
    /// Backing file
    path: PathBuf,

    /// Parser for the file
    reader: Arc<dyn LogFileReader>,

    /// Parsed records, written once on first access
    cache: RwLock<Option<Arc<[LogRecord]>>>,
}

impl RecordSource {
    pub fn new(path: impl Into<PathBuf>, reader: Arc<dyn LogFileReader>) -> Self {
        Self {
            path: path.into(),
            reader,
            cache: RwLock::new(None),
        }
    }

    /// Get the records of this file
    ///
    /// A file that cannot be read yields no records. The result is cached for
    /// the lifetime of the source, even if the file changes afterwards.
    pub fn records(&self) -> Arc<[LogRecord]> {
        if let Some(records) = self.cache.read().as_ref() {
            return Arc::clone(records);
        }

        let mut cache = self.cache.write();
        if let Some(records) = cache.as_ref() {
            return Arc::clone(records);
        }

        let records: Arc<[LogRecord]> = match self.reader.read(&self.path) {
            Ok(records) => records.into(),
            Err(e) => {
                tracing::debug!(
                    path = %self.path.display(),
                    error = %e,
                    "treating unreadable log file as empty"
                );
                Arc::from(Vec::new())
            }
        };
        *cache = Some(Arc::clone(&records));
        records
    }

    /// Check whether the file has been parsed yet
    pub fn is_loaded(&self) -> bool {
        self.cache.read().is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last modification time of the backing file
    pub fn modified(&self) -> Option<DateTime<Local>> {
        modified(&self.path)
    }
}

impl std::fmt::Debug for RecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordSource")
            .field("path", &self.path)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// Last modification time of a file, if it exists
pub fn modified(path: &Path) -> Option<DateTime<Local>> {
    let time = std::fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(DateTime::<Local>::from(time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReadError;
    use crate::reader::MonologReader;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct CountingReader {
        calls: AtomicUsize,
    }

    impl LogFileReader for CountingReader {
        fn read(&self, path: &Path) -> Result<Vec<LogRecord>, ReadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            MonologReader::new().read(path)
        }
    }

    #[test]
    fn test_parses_once_and_keeps_cache() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("laravel.log");
        fs::write(&path, "[2024-01-15 10:30:00] testing.ERROR: one [] []\n").unwrap();

        let reader = Arc::new(CountingReader {
            calls: AtomicUsize::new(0),
        });
        let source = RecordSource::new(&path, reader.clone());
        assert!(!source.is_loaded());
        assert_eq!(source.records().len(), 1);

        fs::remove_file(&path).unwrap();
        assert_eq!(source.records().len(), 1);
        assert_eq!(reader.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deleted_file_yields_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone.log");
        fs::write(&path, "[2024-01-15 10:30:00] testing.ERROR: one [] []\n").unwrap();
        assert!(modified(&path).is_some());
        fs::remove_file(&path).unwrap();

        let source = RecordSource::new(&path, Arc::new(MonologReader::new()));
        assert!(source.records().is_empty());
        assert!(source.is_loaded());
        assert!(source.modified().is_none());
    }
}
