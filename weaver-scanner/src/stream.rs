use crate::aggregator::ResultAggregator;
use crate::config::CrawlConfig;
use crate::frontier::FrontierItem;
use crate::result::{LogEntry, RunCounters, RunState, Severity, UrlResult};
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

pub type RunId = Uuid;

/// Everything a consumer can observe about a run.
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    RunStarted { run_id: RunId, config: CrawlConfig },
    Log(LogEntry),
    Result(UrlResult),
    Counters(RunCounters),
    State(RunState),
}

/// Point-in-time copy of the stream's history.
#[derive(Debug, Clone, Default)]
pub struct StreamSnapshot {
    pub run_id: Option<RunId>,
    pub config: Option<CrawlConfig>,
    pub logs: Vec<LogEntry>,
    pub results: Vec<UrlResult>,
    pub counters: RunCounters,
    pub state: RunState,
}

#[derive(Default)]
struct StreamInner {
    run: Option<(RunId, CrawlConfig)>,
    aggregator: ResultAggregator,
    state: RunState,
    last_timestamp: Option<DateTime<Utc>>,
    subscribers: Vec<mpsc::UnboundedSender<CrawlEvent>>,
}

impl StreamInner {
    fn broadcast(&mut self, event: CrawlEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Wall-clock time, clamped so it never goes backwards within a run.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let timestamp = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);
        timestamp
    }
}

/// Append-only, replayable history of the current run.
///
/// Only the orchestrator writes to it. Consumers either poll [`snapshot`] or
/// [`subscribe`] to receive the history so far followed by live events.
///
/// [`snapshot`]: EventStream::snapshot
/// [`subscribe`]: EventStream::subscribe
pub struct EventStream {
    inner: Mutex<StreamInner>,
    state_tx: watch::Sender<RunState>,
}

impl EventStream {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(RunState::Idle);
        Self {
            inner: Mutex::new(StreamInner::default()),
            state_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StreamInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<CrawlEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();

        if let Some((run_id, config)) = &inner.run {
            let _ = tx.send(CrawlEvent::RunStarted {
                run_id: *run_id,
                config: config.clone(),
            });
        }
        for entry in inner.aggregator.logs() {
            let _ = tx.send(CrawlEvent::Log(entry.clone()));
        }
        for result in inner.aggregator.results() {
            let _ = tx.send(CrawlEvent::Result(result.clone()));
        }
        let _ = tx.send(CrawlEvent::Counters(inner.aggregator.counters()));
        let _ = tx.send(CrawlEvent::State(inner.state));

        inner.subscribers.push(tx);
        rx
    }

    pub fn watch_state(&self) -> watch::Receiver<RunState> {
        self.state_tx.subscribe()
    }

    pub fn snapshot(&self) -> StreamSnapshot {
        let inner = self.lock();
        StreamSnapshot {
            run_id: inner.run.as_ref().map(|(id, _)| *id),
            config: inner.run.as_ref().map(|(_, config)| config.clone()),
            logs: inner.aggregator.logs().to_vec(),
            results: inner.aggregator.results().to_vec(),
            counters: inner.aggregator.counters(),
            state: inner.state,
        }
    }

    pub fn state(&self) -> RunState {
        self.lock().state
    }

    pub fn counters(&self) -> RunCounters {
        self.lock().aggregator.counters()
    }

    pub fn results(&self) -> Vec<UrlResult> {
        self.lock().aggregator.results().to_vec()
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.lock().aggregator.logs().to_vec()
    }

    pub(crate) fn begin_run(&self, run_id: RunId, config: CrawlConfig) {
        let mut inner = self.lock();
        inner.aggregator.reset();
        inner.last_timestamp = None;
        inner.run = Some((run_id, config.clone()));
        inner.broadcast(CrawlEvent::RunStarted { run_id, config });
        let counters = inner.aggregator.counters();
        inner.broadcast(CrawlEvent::Counters(counters));
    }

    pub(crate) fn log(&self, severity: Severity, message: impl Into<String>) {
        let mut inner = self.lock();
        let entry = LogEntry {
            id: Uuid::new_v4(),
            timestamp: inner.next_timestamp(),
            severity,
            message: message.into(),
        };
        inner.aggregator.on_log(entry.clone());
        inner.broadcast(CrawlEvent::Log(entry));
    }

    pub(crate) fn record(&self, item: &FrontierItem, status_code: Option<u16>) -> UrlResult {
        let mut inner = self.lock();
        let result = UrlResult {
            id: Uuid::new_v4(),
            url: item.url.to_string(),
            status_code,
            parent_url: item.parent_url.as_ref().map(ToString::to_string),
            depth: item.depth,
            timestamp: inner.next_timestamp(),
        };
        inner.aggregator.on_result(result.clone());
        inner.broadcast(CrawlEvent::Result(result.clone()));
        let counters = inner.aggregator.counters();
        inner.broadcast(CrawlEvent::Counters(counters));
        result
    }

    pub(crate) fn set_queued(&self, queued: usize) {
        let mut inner = self.lock();
        if inner.aggregator.set_queued(queued) {
            let counters = inner.aggregator.counters();
            inner.broadcast(CrawlEvent::Counters(counters));
        }
    }

    pub(crate) fn set_state(&self, state: RunState) {
        let mut inner = self.lock();
        inner.state = state;
        inner.broadcast(CrawlEvent::State(state));
        self.state_tx.send_replace(state);
    }
}

impl Default for EventStream {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn seed_item() -> FrontierItem {
        FrontierItem::seed(Url::parse("https://example.com/").unwrap())
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<CrawlEvent>) -> Vec<CrawlEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[test]
    fn test_fresh_stream_is_idle_and_empty() {
        let stream = EventStream::new();
        let snapshot = stream.snapshot();
        assert_eq!(snapshot.state, RunState::Idle);
        assert!(snapshot.run_id.is_none());
        assert!(snapshot.logs.is_empty());
        assert!(snapshot.results.is_empty());
    }

    #[test]
    fn test_subscriber_receives_live_events() {
        let stream = EventStream::new();
        let mut rx = stream.subscribe();
        drain(&mut rx);

        stream.log(Severity::Info, "hello");
        let events = drain(&mut rx);
        assert!(matches!(
            events.as_slice(),
            [CrawlEvent::Log(LogEntry { message, .. })] if message == "hello"
        ));
    }

    #[test]
    fn test_late_subscriber_gets_replay() {
        let stream = EventStream::new();
        let run_id = Uuid::new_v4();
        stream.begin_run(run_id, CrawlConfig::new("https://example.com"));
        stream.log(Severity::Info, "first");
        stream.record(&seed_item(), Some(200));
        stream.set_state(RunState::Running);

        let mut rx = stream.subscribe();
        let events = drain(&mut rx);

        assert!(matches!(events[0], CrawlEvent::RunStarted { run_id: id, .. } if id == run_id));
        assert!(matches!(events[1], CrawlEvent::Log(_)));
        assert!(matches!(events[2], CrawlEvent::Result(_)));
        assert!(matches!(
            events[3],
            CrawlEvent::Counters(RunCounters { processed: 1, .. })
        ));
        assert_eq!(events[4], CrawlEvent::State(RunState::Running));
        assert_eq!(events.len(), 5);
    }

    #[test]
    fn test_begin_run_clears_history() {
        let stream = EventStream::new();
        stream.begin_run(Uuid::new_v4(), CrawlConfig::new("https://example.com"));
        stream.log(Severity::Error, "old");
        stream.record(&seed_item(), None);

        stream.begin_run(Uuid::new_v4(), CrawlConfig::new("https://example.org"));

        assert!(stream.logs().is_empty());
        assert!(stream.results().is_empty());
        assert_eq!(stream.counters(), RunCounters::default());
    }

    #[test]
    fn test_log_timestamps_are_monotonic() {
        let stream = EventStream::new();
        for i in 0..50 {
            stream.log(Severity::Info, format!("entry {}", i));
        }
        let logs = stream.logs();
        assert!(logs.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_record_copies_item_fields() {
        let stream = EventStream::new();
        let seed = seed_item();
        let child = seed.child(Url::parse("https://example.com/a").unwrap());

        let result = stream.record(&child, Some(404));

        assert_eq!(result.url, "https://example.com/a");
        assert_eq!(result.parent_url.as_deref(), Some("https://example.com/"));
        assert_eq!(result.depth, 2);
        assert_eq!(stream.counters().errored, 1);
    }

    #[test]
    fn test_closed_subscribers_are_pruned() {
        let stream = EventStream::new();
        let rx = stream.subscribe();
        drop(rx);
        stream.log(Severity::Info, "nobody listening");
        assert!(stream.lock().subscribers.is_empty());
    }

    #[test]
    fn test_set_state_updates_watch() {
        let stream = EventStream::new();
        let rx = stream.watch_state();
        stream.set_state(RunState::Running);
        assert_eq!(*rx.borrow(), RunState::Running);
    }
}
