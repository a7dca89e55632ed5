use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::filter::CompiledFilter;
use crate::reader::LogFileReader;
use crate::resolver::LeafChannel;
use crate::source::RecordSource;
use logscope_types::{AggregatorId, FilterSpec, LogRecord, SourceLabels};

/// Merged, time-ordered records of one logical channel
pub struct Aggregator {
    /// Identifier stamped on every record
    id: AggregatorId,

    /// Channel name shown next to its records
    channel: String,

    /// One source per file
    sources: Vec<RecordSource>,

    /// Accumulated and sorted records, filled on first request
    cache: RwLock<Option<Arc<[LogRecord]>>>,
}

impl Aggregator {
    pub fn new(id: AggregatorId, channel: impl Into<String>, sources: Vec<RecordSource>) -> Self {
        Self {
            id,
            channel: channel.into(),
            sources,
            cache: RwLock::new(None),
        }
    }

    /// Build an aggregator over the files of a resolved leaf channel
    pub fn for_leaf(id: AggregatorId, leaf: &LeafChannel, reader: Arc<dyn LogFileReader>) -> Self {
        let sources = leaf
            .files
            .iter()
            .map(|path| RecordSource::new(path, Arc::clone(&reader)))
            .collect();
        Self::new(id, leaf.name.clone(), sources)
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.sources.iter().map(RecordSource::path)
    }

    /// Get the filtered records, oldest first
    ///
    /// The unfiltered set is accumulated once; every call filters a copy of it.
    pub fn records(&self, filter: &FilterSpec) -> Vec<LogRecord> {
        let all = self.accumulated();
        CompiledFilter::new(filter).apply(&all)
    }

    /// Total number of records before filtering
    pub fn total(&self) -> usize {
        self.accumulated().len()
    }

    fn accumulated(&self) -> Arc<[LogRecord]> {
        if let Some(records) = self.cache.read().as_ref() {
            return Arc::clone(records);
        }

        let mut cache = self.cache.write();
        if let Some(records) = cache.as_ref() {
            return Arc::clone(records);
        }

        let mut records: Vec<LogRecord> = self
            .load_sources()
            .iter()
            .flat_map(|batch| batch.iter().cloned())
            .collect();
        for record in &mut records {
            record.source = Some(self.id);
        }
        sort_records(&mut records);

        tracing::debug!(
            channel = %self.channel,
            files = self.sources.len(),
            records = records.len(),
            "accumulated channel records"
        );

        let records: Arc<[LogRecord]> = records.into();
        *cache = Some(Arc::clone(&records));
        records
    }

    /// Read every source, in parallel when there is more than one
    ///
    /// Batches are returned in source order regardless of completion order.
    fn load_sources(&self) -> Vec<Arc<[LogRecord]>> {
        if self.sources.len() <= 1 {
            return self.sources.iter().map(RecordSource::records).collect();
        }

        std::thread::scope(|scope| {
            let handles: Vec<_> = self
                .sources
                .iter()
                .map(|source| scope.spawn(move || source.records()))
                .collect();

            handles
                .into_iter()
                .zip(&self.sources)
                .map(|(handle, source)| {
                    handle.join().unwrap_or_else(|_| {
                        tracing::warn!(
                            path = %source.path().display(),
                            "log reader panicked, skipping file"
                        );
                        Arc::from(Vec::new())
                    })
                })
                .collect()
        })
    }
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("id", &self.id)
            .field("channel", &self.channel)
            .field("sources", &self.sources)
            .finish()
    }
}

/// Aggregator over several channels
///
/// Each child is filtered on its own, then the union is re-sorted and the
/// count limit applied again so that no channel is favoured by its position.
#[derive(Debug, Default)]
pub struct MultiAggregator {
    children: Vec<Aggregator>,
}

impl MultiAggregator {
    /// Build one child per leaf channel; child ids are their indices
    pub fn from_leaves(leaves: &[LeafChannel], reader: Arc<dyn LogFileReader>) -> Self {
        let children = leaves
            .iter()
            .enumerate()
            .map(|(i, leaf)| Aggregator::for_leaf(AggregatorId(i), leaf, Arc::clone(&reader)))
            .collect();
        Self { children }
    }

    pub fn get(&self, id: AggregatorId) -> Option<&Aggregator> {
        self.children.get(id.0)
    }

    /// All files across children, in order
    pub fn files(&self) -> Vec<PathBuf> {
        self.children
            .iter()
            .flat_map(|child| child.files().map(Path::to_path_buf))
            .collect()
    }

    /// Get the filtered records of every channel, oldest first
    pub fn records(&self, filter: &FilterSpec) -> Vec<LogRecord> {
        let mut records: Vec<LogRecord> = self
            .children
            .iter()
            .flat_map(|child| child.records(filter))
            .collect();
        sort_records(&mut records);
        CompiledFilter::new(filter).limit(&mut records);
        records
    }
}

impl SourceLabels for MultiAggregator {
    fn label(&self, id: AggregatorId) -> Option<&str> {
        self.get(id).map(Aggregator::channel)
    }
}

/// Stable sort by timestamp; equal timestamps keep file-then-parse order
fn sort_records(records: &mut [LogRecord]) {
    records.sort_by_key(|record| record.timestamp);
}
