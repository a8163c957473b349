//! Bounded query history tracking.
//!
//! A fixed-capacity ring buffer of executed queries with outcome metadata.
//! Once capacity is reached, each new entry evicts the oldest. All
//! operations are safe under concurrent callers; the critical section is
//! brief and never spans an await point.

use crate::error::DbResult;
use crate::models::{GetQueryHistoryInput, QueryHistoryEntry, QueryHistoryOutput};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// Concurrency-safe, fixed-capacity query history.
#[derive(Debug)]
pub struct QueryHistory {
    entries: Mutex<VecDeque<QueryHistoryEntry>>,
    capacity: usize,
}

impl QueryHistory {
    /// Create a new history with the given capacity (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<QueryHistoryEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an entry, evicting the oldest if at capacity.
    pub fn record(&self, entry: QueryHistoryEntry) {
        let mut entries = self.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Get up to `limit` recent entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<QueryHistoryEntry> {
        self.lock().iter().rev().take(limit).cloned().collect()
    }

    /// Current number of entries.
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Handler for the get_query_history tool.
pub struct HistoryToolHandler {
    history: Arc<QueryHistory>,
}

impl HistoryToolHandler {
    pub fn new(history: Arc<QueryHistory>) -> Self {
        Self { history }
    }

    /// Retrieve recent query history, newest first.
    pub fn get_query_history(&self, input: GetQueryHistoryInput) -> DbResult<QueryHistoryOutput> {
        input.validate()?;
        Ok(QueryHistoryOutput {
            queries: self.history.recent(input.limit),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutputFormat;

    fn entry(query: &str) -> QueryHistoryEntry {
        QueryHistoryEntry::success(query, 1.0, 0, OutputFormat::Json)
    }

    #[test]
    fn test_record_and_count() {
        let history = QueryHistory::new(10);
        assert_eq!(history.count(), 0);
        history.record(entry("SELECT 1"));
        history.record(entry("SELECT 2"));
        assert_eq!(history.count(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let history = QueryHistory::new(3);
        for i in 0..4 {
            history.record(entry(&format!("SELECT {i}")));
        }
        assert_eq!(history.count(), 3);

        let recent = history.recent(3);
        let queries: Vec<&str> = recent.iter().map(|e| e.query.as_str()).collect();
        assert_eq!(queries, vec!["SELECT 3", "SELECT 2", "SELECT 1"]);
        assert!(!queries.contains(&"SELECT 0"), "oldest entry must be evicted");
    }

    #[test]
    fn test_recent_newest_first() {
        let history = QueryHistory::new(10);
        history.record(entry("first"));
        history.record(entry("second"));
        history.record(entry("third"));

        let recent = history.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].query, "third");
        assert_eq!(recent[1].query, "second");
    }

    #[test]
    fn test_recent_limit_exceeding_count() {
        let history = QueryHistory::new(10);
        history.record(entry("only"));
        assert_eq!(history.recent(100).len(), 1);
    }

    #[test]
    fn test_clear() {
        let history = QueryHistory::new(5);
        history.record(entry("SELECT 1"));
        history.clear();
        assert_eq!(history.count(), 0);
        assert!(history.recent(5).is_empty());
    }

    #[test]
    fn test_zero_capacity_clamped_to_one() {
        let history = QueryHistory::new(0);
        assert_eq!(history.capacity(), 1);
        history.record(entry("a"));
        history.record(entry("b"));
        assert_eq!(history.count(), 1);
        assert_eq!(history.recent(1)[0].query, "b");
    }

    #[test]
    fn test_concurrent_recording() {
        let history = Arc::new(QueryHistory::new(1000));
        let mut handles = Vec::new();

        for t in 0..8 {
            let history = Arc::clone(&history);
            handles.push(std::thread::spawn(move || {
                for i in 0..100 {
                    history.record(entry(&format!("SELECT {t}, {i}")));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(history.count(), 800);
    }

    #[test]
    fn test_handler_rejects_out_of_range_limit() {
        let handler = HistoryToolHandler::new(Arc::new(QueryHistory::new(10)));
        assert!(
            handler
                .get_query_history(GetQueryHistoryInput { limit: 0 })
                .is_err()
        );
        assert!(
            handler
                .get_query_history(GetQueryHistoryInput { limit: 101 })
                .is_err()
        );
        assert!(
            handler
                .get_query_history(GetQueryHistoryInput { limit: 100 })
                .is_ok()
        );
    }
}
