use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion activity.
#[derive(Default)]
pub struct IngestMetrics {
    documents_indexed: AtomicU64,
    documents_failed: AtomicU64,
    chunks_indexed: AtomicU64,
    batches_upserted: AtomicU64,
}

impl IngestMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed document with the number of records and batches written for it.
    pub fn record_document(&self, chunk_count: u64, batch_count: u64) {
        self.documents_indexed.fetch_add(1, Ordering::Relaxed);
        self.chunks_indexed.fetch_add(chunk_count, Ordering::Relaxed);
        self.batches_upserted
            .fetch_add(batch_count, Ordering::Relaxed);
    }

    /// Record a failed run. Batches committed before the failure still count.
    pub fn record_failure(&self, committed_records: u64, committed_batches: u64) {
        self.documents_failed.fetch_add(1, Ordering::Relaxed);
        self.chunks_indexed
            .fetch_add(committed_records, Ordering::Relaxed);
        self.batches_upserted
            .fetch_add(committed_batches, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_indexed: self.documents_indexed.load(Ordering::Relaxed),
            documents_failed: self.documents_failed.load(Ordering::Relaxed),
            chunks_indexed: self.chunks_indexed.load(Ordering::Relaxed),
            batches_upserted: self.batches_upserted.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of ingestion counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents that reached `Completed` since startup.
    pub documents_indexed: u64,
    /// Documents that ended in `Failed`.
    pub documents_failed: u64,
    /// Records committed to the vector index.
    pub chunks_indexed: u64,
    /// Upsert requests that succeeded.
    pub batches_upserted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_documents_and_chunks() {
        let metrics = IngestMetrics::new();
        metrics.record_document(2, 1);
        metrics.record_document(130, 3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_indexed, 2);
        assert_eq!(snapshot.chunks_indexed, 132);
        assert_eq!(snapshot.batches_upserted, 4);
        assert_eq!(snapshot.documents_failed, 0);
    }

    #[test]
    fn failures_keep_committed_work() {
        let metrics = IngestMetrics::new();
        metrics.record_failure(50, 1);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_failed, 1);
        assert_eq!(snapshot.documents_indexed, 0);
        assert_eq!(snapshot.chunks_indexed, 50);
        assert_eq!(snapshot.batches_upserted, 1);
    }
}
