use crate::result::{LogEntry, RunCounters, UrlResult};

/// Ordered result and log history for the current run, plus rolling counters.
#[derive(Debug, Default, Clone)]
pub struct ResultAggregator {
    results: Vec<UrlResult>,
    logs: Vec<LogEntry>,
    counters: RunCounters,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Results are kept in completion order.
    pub fn on_result(&mut self, result: UrlResult) {
        if result.is_error() {
            self.counters.errored += 1;
        } else {
            self.counters.processed += 1;
        }
        self.results.push(result);
    }

    pub fn on_log(&mut self, entry: LogEntry) {
        self.logs.push(entry);
    }

    /// Returns `true` if the value changed.
    pub fn set_queued(&mut self, queued: usize) -> bool {
        let changed = self.counters.queued != queued;
        self.counters.queued = queued;
        changed
    }

    pub fn reset(&mut self) {
        self.results.clear();
        self.logs.clear();
        self.counters = RunCounters::default();
    }

    pub fn results(&self) -> &[UrlResult] {
        &self.results
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn counters(&self) -> RunCounters {
        self.counters
    }
}
