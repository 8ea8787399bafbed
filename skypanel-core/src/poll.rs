//! Interval polling with cycle sequencing.
//!
//! Every tick starts a new acquisition cycle in its own task. Cycles are
//! numbered in start order; a result is published only if no newer cycle
//! has been published already, so a slow, superseded cycle can never replace
//! a fresher result. Superseded requests are not aborted.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info, warn};

use crate::{FetchRequest, NormalizedWeather, WeatherError, provider::WeatherProvider};

/// Outcome of one cycle, tagged with its sequence number.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    pub result: Result<NormalizedWeather, WeatherError>,
}

/// Issues cycle ids and holds the latest published report.
#[derive(Debug)]
pub struct CycleSequencer {
    issued: AtomicU64,
    latest: watch::Sender<Option<CycleReport>>,
}

impl Default for CycleSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleSequencer {
    pub fn new() -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            issued: AtomicU64::new(0),
            latest,
        }
    }

    /// Start a new cycle; ids begin at 1 and strictly increase.
    pub fn begin(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish `report` unless a newer (or the same) cycle was already published.
    pub fn offer(&self, report: CycleReport) -> bool {
        let cycle = report.cycle;
        let published = self.latest.send_if_modified(|latest| {
            if latest.as_ref().is_some_and(|current| current.cycle >= cycle) {
                return false;
            }
            *latest = Some(report);
            true
        });

        if !published {
            warn!(cycle, "discarding result from superseded cycle");
        }
        published
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<CycleReport>> {
        self.latest.subscribe()
    }

    pub fn has_subscribers(&self) -> bool {
        !self.latest.is_closed()
    }
}

/// Shortest accepted polling interval.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Re-requests weather for one location on a fixed interval.
#[derive(Debug)]
pub struct Poller {
    provider: Arc<dyn WeatherProvider>,
    request: FetchRequest,
    every: Duration,
    sequencer: Arc<CycleSequencer>,
}

impl Poller {
    /// `every` is clamped to at least [`MIN_INTERVAL`].
    pub fn new(provider: Arc<dyn WeatherProvider>, request: FetchRequest, every: Duration) -> Self {
        Self {
            provider,
            request,
            every: every.max(MIN_INTERVAL),
            sequencer: Arc::new(CycleSequencer::new()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<CycleReport>> {
        self.sequencer.subscribe()
    }

    /// Start one cycle in the background.
    pub fn spawn_cycle(&self) -> JoinHandle<bool> {
        let cycle = self.sequencer.begin();
        let provider = Arc::clone(&self.provider);
        let request = self.request.clone();
        let sequencer = Arc::clone(&self.sequencer);

        debug!(cycle, provider = %provider.id(), "starting acquisition cycle");

        tokio::spawn(async move {
            let result = provider.fetch(&request).await;
            sequencer.offer(CycleReport { cycle, result })
        })
    }

    /// Tick forever (first tick is immediate) until every subscriber is gone.
    pub async fn run(self) {
        info!(every_secs = self.every.as_secs(), "weather polling started");

        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if !self.sequencer.has_subscribers() {
                info!("no subscribers left; weather polling stopped");
                break;
            }
            let _cycle = self.spawn_cycle();
        }
    }
}
