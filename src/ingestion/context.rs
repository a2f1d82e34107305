//! Per-run accumulator threaded through the ingestion pipeline.
//!
//! Carries the immutable run identity (ids, method, window, source) and
//! the mutable counters plus the in-memory reject list. Not shared across
//! invocations; each execution owns its context.

use crate::models::RequestSource;

/// One rejected input record, kept in memory until run finalization.
#[derive(Debug, Clone)]
pub struct RejectedRecord {
    pub raw_data: String,
    pub reason: String,
    pub is_parse_error: bool,
}

#[derive(Debug)]
pub struct RunContext {
    run_id: i64,
    method_name: String,
    window_key: String,
    request_id: String,
    request_source: RequestSource,

    records_seen: i32,
    records_inserted: i32,
    records_updated: i32,
    reject_count: i32,
    parse_errors: i32,
    rejected: Vec<RejectedRecord>,
}

impl RunContext {
    pub fn new(
        run_id: i64,
        method_name: impl Into<String>,
        window_key: impl Into<String>,
        request_id: impl Into<String>,
        request_source: RequestSource,
    ) -> Self {
        Self {
            run_id,
            method_name: method_name.into(),
            window_key: window_key.into(),
            request_id: request_id.into(),
            request_source,
            records_seen: 0,
            records_inserted: 0,
            records_updated: 0,
            reject_count: 0,
            parse_errors: 0,
            rejected: Vec::new(),
        }
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn window_key(&self) -> &str {
        &self.window_key
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn request_source(&self) -> RequestSource {
        self.request_source
    }

    pub fn records_seen(&self) -> i32 {
        self.records_seen
    }

    pub fn records_inserted(&self) -> i32 {
        self.records_inserted
    }

    pub fn records_updated(&self) -> i32 {
        self.records_updated
    }

    pub fn reject_count(&self) -> i32 {
        self.reject_count
    }

    pub fn parse_errors(&self) -> i32 {
        self.parse_errors
    }

    pub fn rejected_records(&self) -> &[RejectedRecord] {
        &self.rejected
    }

    /// Counts one record encountered, processed or not.
    pub fn mark_seen(&mut self) {
        self.records_seen += 1;
    }

    /// Counts rows actually written by a flush.
    pub fn add_inserted(&mut self, count: usize) {
        self.records_inserted += count as i32;
    }

    /// Records a validation rejection.
    pub fn add_reject(&mut self, raw_data: impl Into<String>, reason: impl Into<String>) {
        self.push_reject(raw_data, reason, false);
    }

    /// Records a rejection caused by a parse failure.
    pub fn add_parse_reject(&mut self, raw_data: impl Into<String>, reason: impl Into<String>) {
        self.parse_errors += 1;
        self.push_reject(raw_data, reason, true);
    }

    fn push_reject(
        &mut self,
        raw_data: impl Into<String>,
        reason: impl Into<String>,
        is_parse_error: bool,
    ) {
        self.rejected.push(RejectedRecord {
            raw_data: raw_data.into(),
            reason: reason.into(),
            is_parse_error,
        });
        self.reject_count += 1;
    }

    /// Concise metric summary for logs; the reject list itself stays out
    /// of log lines and is persisted separately.
    pub fn log_summary(&self) -> String {
        format!(
            "runId={}, method={}, window={}, seen={}, inserted={}, updated={}, rejected={}, parseErrors={}",
            self.run_id,
            self.method_name,
            self.window_key,
            self.records_seen,
            self.records_inserted,
            self.records_updated,
            self.reject_count,
            self.parse_errors,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let mut context = RunContext::new(
            7,
            "promediosSipsaCiudad",
            "2026-01-02",
            "req-1",
            RequestSource::Manual,
        );

        context.mark_seen();
        context.mark_seen();
        context.add_inserted(1);
        context.add_reject("regId=, codProducto=5", "Missing: regId");
        context.add_parse_reject("<broken", "truncated element");

        assert_eq!(context.records_seen(), 2);
        assert_eq!(context.records_inserted(), 1);
        assert_eq!(context.reject_count(), 2);
        assert_eq!(context.parse_errors(), 1);
        assert_eq!(context.rejected_records().len(), 2);
        assert!(context.rejected_records()[1].is_parse_error);
    }

    #[test]
    fn summary_omits_reject_payloads() {
        let mut context =
            RunContext::new(1, "m", "2026-01-02", "req", RequestSource::Scheduled);
        context.add_reject("sensitive raw data", "Missing: fuenId");

        let summary = context.log_summary();
        assert!(summary.contains("rejected=1"));
        assert!(!summary.contains("sensitive raw data"));
    }
}
