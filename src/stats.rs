use crate::models::{Dimension, Row};
use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics collected while decoding a feed stream
#[derive(Default)]
pub struct DecodeStats {
    pub lines_read: AtomicU64,
    pub rows_decoded: AtomicU64,
    pub malformed_lines: AtomicU64,
    pub anonymous_edits: AtomicU64,
    pub geo_enriched: AtomicU64,
}

impl DecodeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_lines(&self, count: u64) {
        self.lines_read.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_malformed(&self) {
        self.malformed_lines.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a decoded row along with its anonymity and geo outcome.
    pub fn record_row(&self, row: &Row) {
        self.rows_decoded.fetch_add(1, Ordering::Relaxed);
        if row.dimension(Dimension::Anonymous) == Some("true") {
            self.anonymous_edits.fetch_add(1, Ordering::Relaxed);
            let located = [
                Dimension::Continent,
                Dimension::Country,
                Dimension::Region,
                Dimension::City,
            ]
            .into_iter()
            .any(|d| row.dimension(d).is_some());
            if located {
                self.geo_enriched.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn lines(&self) -> u64 {
        self.lines_read.load(Ordering::Relaxed)
    }

    pub fn rows(&self) -> u64 {
        self.rows_decoded.load(Ordering::Relaxed)
    }

    pub fn malformed(&self) -> u64 {
        self.malformed_lines.load(Ordering::Relaxed)
    }

    pub fn anonymous(&self) -> u64 {
        self.anonymous_edits.load(Ordering::Relaxed)
    }

    pub fn located(&self) -> u64 {
        self.geo_enriched.load(Ordering::Relaxed)
    }
}
