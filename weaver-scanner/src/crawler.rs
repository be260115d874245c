use crate::config::{CrawlConfig, DEFAULT_WORKERS};
use crate::error::{CrawlError, Result};
use crate::fetch::{FetchSettings, Fetcher, HttpFetcher};
use crate::frontier::{Frontier, FrontierItem};
use crate::result::{Classification, FetchOutcome, LogEntry, RunCounters, RunState, Severity, UrlResult};
use crate::scope::ScopeFilter;
use crate::stream::{CrawlEvent, EventStream, RunId, StreamSnapshot};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

struct RunControl {
    state: RunState,
    stop_requested: bool,
}

struct Shared {
    control: Mutex<RunControl>,
    stream: EventStream,
}

impl Shared {
    fn control(&self) -> MutexGuard<'_, RunControl> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stop_requested(&self) -> bool {
        self.control().stop_requested
    }
}

/// Owns the lifecycle of one crawl run at a time.
///
/// `start` validates the config and spawns the run onto the current tokio
/// runtime; progress is observed through [`EventStream`]. Cloning is cheap and
/// every clone drives the same engine.
///
/// The one-run limit is per engine, not per process: clones share it, while
/// separately constructed crawlers each have their own state and stream and
/// may run at the same time.
#[derive(Clone)]
pub struct Crawler {
    fetcher: Arc<dyn Fetcher>,
    workers: usize,
    shared: Arc<Shared>,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            workers: DEFAULT_WORKERS,
            shared: Arc::new(Shared {
                control: Mutex::new(RunControl {
                    state: RunState::Idle,
                    stop_requested: false,
                }),
                stream: EventStream::new(),
            }),
        }
    }

    /// Crawler backed by the bundled HTTP fetcher.
    pub fn with_http(settings: FetchSettings) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpFetcher::new(settings)?)))
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<CrawlEvent> {
        self.shared.stream.subscribe()
    }

    pub fn snapshot(&self) -> StreamSnapshot {
        self.shared.stream.snapshot()
    }

    pub fn state(&self) -> RunState {
        self.shared.stream.state()
    }

    pub fn counters(&self) -> RunCounters {
        self.shared.stream.counters()
    }

    pub fn results(&self) -> Vec<UrlResult> {
        self.shared.stream.results()
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.shared.stream.logs()
    }

    /// Starts a run. Must be called from within a tokio runtime.
    ///
    /// Rejected configs and concurrent starts leave the stream untouched.
    pub fn start(&self, config: CrawlConfig) -> Result<RunId> {
        let seed = config.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| CrawlError::NoRuntime)?;

        let mut control = self.shared.control();
        if control.state != RunState::Idle {
            return Err(CrawlError::AlreadyRunning);
        }
        control.state = RunState::Running;
        control.stop_requested = false;

        let run_id = Uuid::new_v4();
        let stream = &self.shared.stream;
        stream.begin_run(run_id, config.clone());

        let mut frontier = Frontier::new(config.max_depth);
        frontier.enqueue(FrontierItem::seed(seed.clone()));
        stream.set_queued(frontier.size());
        stream.set_state(RunState::Running);
        stream.log(
            Severity::Info,
            format!(
                "Starting crawl of {} (max depth {}, {})",
                seed,
                config.max_depth,
                config.scope_label()
            ),
        );
        drop(control);

        info!(
            "Starting crawl {} of {} with {} workers",
            run_id, seed, self.workers
        );

        let run = RunLoop {
            fetcher: self.fetcher.clone(),
            shared: self.shared.clone(),
            workers: self.workers,
            frontier,
            scope: ScopeFilter::new(seed, config.same_domain_only),
        };
        runtime.spawn(run.execute());

        Ok(run_id)
    }

    /// Requests a cooperative stop. In-flight fetches still complete and are
    /// recorded; nothing new is dispatched. No-op unless a run is `Running`.
    pub fn stop(&self) {
        let mut control = self.shared.control();
        if control.state != RunState::Running {
            return;
        }
        control.state = RunState::Stopping;
        control.stop_requested = true;

        let stream = &self.shared.stream;
        stream.set_state(RunState::Stopping);
        stream.log(Severity::Warning, "Crawl interrupted by user");
        info!("Stop requested, draining in-flight fetches");
    }

    /// Resolves once the engine is back to `Idle`.
    pub async fn wait_until_idle(&self) {
        let mut state_rx = self.shared.stream.watch_state();
        let _ = state_rx.wait_for(|state| *state == RunState::Idle).await;
    }
}

/// State owned exclusively by the spawned run task. Only this task touches the
/// frontier; workers hand their outcomes back through the join set.
struct RunLoop {
    fetcher: Arc<dyn Fetcher>,
    shared: Arc<Shared>,
    workers: usize,
    frontier: Frontier,
    scope: ScopeFilter,
}

impl RunLoop {
    async fn execute(mut self) {
        let mut in_flight: JoinSet<(FrontierItem, FetchOutcome)> = JoinSet::new();

        loop {
            if !self.shared.stop_requested() {
                while in_flight.len() < self.workers {
                    let Some(item) = self.frontier.dequeue() else {
                        break;
                    };
                    self.dispatch(&mut in_flight, item);
                }
            }
            self.shared.stream.set_queued(self.frontier.size());

            let Some(joined) = in_flight.join_next().await else {
                break;
            };
            match joined {
                Ok((item, outcome)) => self.handle_outcome(item, outcome),
                Err(e) => warn!("Fetch task failed: {}", e),
            }
        }

        self.finish();
    }

    fn dispatch(&self, in_flight: &mut JoinSet<(FrontierItem, FetchOutcome)>, item: FrontierItem) {
        debug!("Dispatching {} (depth {})", item.url, item.depth);
        let fetcher = self.fetcher.clone();

        in_flight.spawn(async move {
            let outcome = AssertUnwindSafe(fetcher.fetch(&item.url))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| FetchOutcome::with_error("fetcher panicked"));
            (item, outcome)
        });
    }

    fn handle_outcome(&mut self, item: FrontierItem, outcome: FetchOutcome) {
        let stream = &self.shared.stream;

        match (outcome.classification(), outcome.status_code) {
            (Classification::Success, Some(code)) => {
                stream.log(Severity::Success, format!("Found: {} [{}]", item.url, code));
            }
            (Classification::ClientError | Classification::ServerError, Some(code)) => {
                stream.log(Severity::Error, format!("Error {}: {}", code, item.url));
            }
            _ => {
                let reason = outcome.error.as_deref().unwrap_or("no response");
                stream.log(
                    Severity::Error,
                    format!("Fetch failed: {} ({})", item.url, reason),
                );
            }
        }
        stream.record(&item, outcome.status_code);

        if outcome.classification() == Classification::Success {
            let queued = self.enqueue_links(&item, &outcome.links);
            debug!("Queued {} of {} links from {}", queued, outcome.links.len(), item.url);
        }
    }

    /// Over-depth, duplicate and out-of-scope links are dropped silently.
    fn enqueue_links(&mut self, parent: &FrontierItem, links: &[String]) -> usize {
        let mut queued = 0;
        for link in links {
            let Ok(url) = parent.url.join(link) else {
                continue;
            };
            if self.scope.is_in_scope(&url) && self.frontier.enqueue(parent.child(url)) {
                queued += 1;
            }
        }
        queued
    }

    fn finish(mut self) {
        let mut control = self.shared.control();
        let stream = &self.shared.stream;

        let discarded = self.frontier.discard_pending();
        stream.set_queued(0);

        if control.stop_requested {
            info!(
                "Crawl stopped. Visited {} URLs, discarded {} pending",
                stream.results().len(),
                discarded
            );
        } else {
            stream.log(Severity::Success, "Crawl complete");
            info!("Crawl complete. Visited {} URLs", stream.results().len());
        }

        control.state = RunState::Idle;
        control.stop_requested = false;
        stream.set_state(RunState::Idle);
    }
}
