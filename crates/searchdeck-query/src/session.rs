//! Session-scoped mutable state: the one authoritative context object,
//! created at authentication time and dropped at logout/reset.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// History keeps the ten most recent searches; older entries are evicted.
pub const HISTORY_CAP: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub query_text: String,
    pub collection: String,
    pub result_count: usize,
    pub elapsed_seconds: f64,
}

/// Running statistics over all searches of the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryStats {
    pub total_queries: u64,
    pub avg_response_time: f64,
}

impl QueryStats {
    pub fn record(&mut self, elapsed_seconds: f64) {
        self.total_queries += 1;
        let n = self.total_queries as f64;
        self.avg_response_time = (self.avg_response_time * (n - 1.0) + elapsed_seconds) / n;
    }
}

#[derive(Debug, Default)]
pub struct SessionContext {
    discovered_properties: HashMap<String, Vec<String>>,
    history: Vec<SearchHistoryEntry>,
    stats: QueryStats,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the property list discovered for a collection; requests with
    /// no explicit selection fall back to this.
    pub fn remember_properties(&mut self, collection: &str, properties: Vec<String>) {
        self.discovered_properties
            .insert(collection.to_string(), properties);
    }

    pub fn properties_for(&self, collection: &str) -> Option<&[String]> {
        self.discovered_properties
            .get(collection)
            .map(Vec::as_slice)
    }

    /// Append-only, most-recent-first, capped.
    pub fn record_search(&mut self, entry: SearchHistoryEntry) {
        self.stats.record(entry.elapsed_seconds);
        self.history.insert(0, entry);
        self.history.truncate(HISTORY_CAP);
    }

    pub fn history(&self) -> &[SearchHistoryEntry] {
        &self.history
    }

    pub fn stats(&self) -> &QueryStats {
        &self.stats
    }
}
