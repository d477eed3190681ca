//! One polled feed and the task that drives it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::StationCode;
use crate::transit::{TransitApi, TransitError};

use super::feed::{BoardFeed, Feed};
use super::snapshot::{LoadState, Snapshot};

/// Default time between automatic refreshes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Polling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub refresh_interval: Duration,
}

impl PollConfig {
    pub fn every(refresh_interval: Duration) -> Self {
        Self { refresh_interval }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

/// State shared between a subscription and its worker.
struct Shared<R> {
    snapshot: watch::Sender<Snapshot<R>>,
    /// Bumped on every switch. Results from older generations are dropped.
    generation: AtomicU64,
}

impl<R> Shared<R> {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

/// A live, periodically refreshed view of one feed.
///
/// The first fetch starts immediately; after that the feed is refreshed
/// every [`PollConfig::refresh_interval`] until the subscription is dropped
/// or [`unsubscribe`](Self::unsubscribe)d. Consumers read state through
/// [`watch`](Self::watch) or [`snapshot`](Self::snapshot).
///
/// Must be created inside a Tokio runtime.
pub struct Subscription<A: TransitApi, F: Feed> {
    api: Arc<A>,
    feed: F,
    config: PollConfig,
    shared: Arc<Shared<F::Record>>,
    refresh: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl<A: TransitApi, F: Feed> Subscription<A, F> {
    /// Start polling `feed`.
    pub fn start(api: Arc<A>, feed: F, config: PollConfig) -> Self {
        let (snapshot, _) = watch::channel(Snapshot::idle());
        let shared = Arc::new(Shared {
            snapshot,
            generation: AtomicU64::new(0),
        });

        let mut subscription = Self {
            api,
            feed,
            config,
            shared,
            refresh: Arc::new(Notify::new()),
            task: None,
        };
        subscription.spawn();
        subscription
    }

    /// Receiver that observes every published snapshot.
    pub fn watch(&self) -> watch::Receiver<Snapshot<F::Record>> {
        self.shared.snapshot.subscribe()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Snapshot<F::Record> {
        self.shared.snapshot.borrow().clone()
    }

    /// The feed being polled.
    pub fn feed(&self) -> &F {
        &self.feed
    }

    /// Refresh now, or retry after a failure.
    ///
    /// Ignored while a request is in flight. Returns whether a refresh was
    /// queued.
    pub fn refresh_now(&self) -> bool {
        if self.shared.snapshot.borrow().is_busy() {
            debug!(feed = %self.feed, "refresh already in flight");
            return false;
        }
        self.refresh.notify_one();
        true
    }

    /// Poll a different feed.
    ///
    /// Cancels the timer and any in-flight request, clears the data and
    /// starts again from `Loading`.
    pub fn switch(&mut self, feed: F) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }

        info!(from = %self.feed, to = %feed, "switching feed");
        self.feed = feed;
        self.refresh = Arc::new(Notify::new());
        self.spawn();
    }

    /// Stop polling. Receivers see the channel close.
    pub fn unsubscribe(self) {
        debug!(feed = %self.feed, "unsubscribing");
    }

    fn spawn(&mut self) {
        let generation = self.shared.generation.load(Ordering::SeqCst);
        self.shared.snapshot.send_replace(Snapshot {
            state: LoadState::Loading,
            ..Snapshot::idle()
        });

        let worker = Worker {
            api: Arc::clone(&self.api),
            feed: self.feed.clone(),
            shared: Arc::clone(&self.shared),
            generation,
        };
        let refresh = Arc::clone(&self.refresh);
        let period = self.config.refresh_interval;
        self.task = Some(tokio::spawn(worker.run(period, refresh)));
    }
}

impl<A: TransitApi> Subscription<A, BoardFeed> {
    /// Flip between departures and arrivals.
    pub fn toggle_mode(&mut self) {
        let mode = self.feed.mode.toggled();
        let feed = self.feed.clone().with_mode(mode);
        self.switch(feed);
    }

    /// Show another station's board. A no-op for the current station.
    pub fn change_station(&mut self, station: StationCode) {
        if station == self.feed.station {
            return;
        }
        let feed = self.feed.clone().with_station(station);
        self.switch(feed);
    }
}

impl<A: TransitApi, F: Feed> Drop for Subscription<A, F> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct Worker<A, F: Feed> {
    api: Arc<A>,
    feed: F,
    shared: Arc<Shared<F::Record>>,
    generation: u64,
}

impl<A: TransitApi, F: Feed> Worker<A, F> {
    async fn run(self, period: Duration, refresh: Arc<Notify>) {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut timed = self.poll().await;
        ticker.reset();

        loop {
            tokio::select! {
                _ = ticker.tick(), if timed => {}
                _ = refresh.notified() => {}
            }
            timed = self.poll().await;
            ticker.reset();
        }
    }

    /// Fetch once and publish the outcome.
    ///
    /// Returns whether timed polling should continue.
    async fn poll(&self) -> bool {
        let Some(phase) = self.begin() else {
            return false;
        };

        let result = self.feed.fetch(self.api.as_ref()).await;
        match self.apply(phase, result) {
            Some(Err(retryable)) => retryable,
            _ => true,
        }
    }

    /// Enter `Refreshing` if there is data to keep showing, `Loading`
    /// otherwise. `None` if this worker is stale.
    fn begin(&self) -> Option<LoadState> {
        let mut phase = None;
        self.shared.snapshot.send_if_modified(|s| {
            if !self.shared.is_current(self.generation) {
                return false;
            }
            let next = if s.state == LoadState::Ready {
                LoadState::Refreshing
            } else {
                s.error_message = None;
                LoadState::Loading
            };
            phase = Some(next);
            let changed = s.state != next;
            s.state = next;
            changed
        });
        phase
    }

    /// Publish a fetch result.
    ///
    /// `None` if the result was stale and discarded, otherwise whether it
    /// succeeded (`Err` carries retryability).
    fn apply(
        &self,
        phase: LoadState,
        result: Result<Vec<F::Record>, TransitError>,
    ) -> Option<Result<(), bool>> {
        let mut outcome = None;
        self.shared.snapshot.send_if_modified(|s| {
            if !self.shared.is_current(self.generation) {
                return false;
            }
            match result {
                Ok(records) => {
                    if s.state != LoadState::Refreshing {
                        info!(feed = %self.feed, records = records.len(), "feed ready");
                    }
                    s.state = LoadState::Ready;
                    s.data = Arc::new(records);
                    s.error_message = None;
                    s.last_updated_at = Some(Utc::now());
                    outcome = Some(Ok(()));
                }
                Err(e) if phase == LoadState::Refreshing => {
                    warn!(feed = %self.feed, error = %e, "refresh failed, keeping previous data");
                    s.state = LoadState::Ready;
                    outcome = Some(Ok(()));
                }
                Err(e) => {
                    warn!(
                        feed = %self.feed,
                        error = %e,
                        retryable = e.is_retryable(),
                        "feed failed"
                    );
                    s.state = LoadState::Failed;
                    s.data = Arc::new(Vec::new());
                    s.error_message = Some(e.to_string());
                    outcome = Some(Err(e.is_retryable()));
                }
            }
            true
        });

        if outcome.is_none() {
            debug!(feed = %self.feed, generation = self.generation, "discarding stale response");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polling::{BoardMode, VehicleFeed};
    use crate::transit::{Endpoint, MockTransitClient, VehicleQuery};
    use serde_json::{Value, json};

    fn code(s: &str) -> StationCode {
        StationCode::parse(s).unwrap()
    }

    fn board(direction: &str) -> Value {
        json!({"payload": {"departures": [
            {"plannedDateTime": "2025-03-01T10:15:00+0100", "direction": direction},
            {"plannedDateTime": "2025-03-01T10:25:00+0100", "direction": direction}
        ]}})
    }

    async fn mock_with_boards() -> MockTransitClient {
        let mock = MockTransitClient::new();
        mock.set_departures(&code("UT"), board("Zwolle")).await;
        mock.set_departures(&code("ASD"), board("Rotterdam Centraal"))
            .await;
        mock.set_arrivals(
            &code("UT"),
            json!({"payload": {"arrivals": [
                {"plannedDateTime": "2025-03-01T10:12:00+0100", "origin": "Den Helder"}
            ]}}),
        )
        .await;
        mock
    }

    fn start(mock: &MockTransitClient, station: &str) -> Subscription<MockTransitClient, BoardFeed> {
        Subscription::start(
            Arc::new(mock.clone()),
            BoardFeed::departures(code(station)),
            PollConfig::default(),
        )
    }

    async fn wait_for_state<R>(rx: &mut watch::Receiver<Snapshot<R>>, state: LoadState) {
        rx.wait_for(|s| s.state == state).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn first_fetch_becomes_ready() {
        let mock = mock_with_boards().await;
        let sub = start(&mock, "UT");
        assert_eq!(sub.snapshot().state, LoadState::Loading);
        assert!(sub.snapshot().is_first_load());

        let mut rx = sub.watch();
        wait_for_state(&mut rx, LoadState::Ready).await;

        let snapshot = sub.snapshot();
        assert_eq!(snapshot.data.len(), 2);
        assert_eq!(snapshot.data[0].destination_name, "Zwolle");
        assert!(snapshot.error_message.is_none());
        assert!(snapshot.last_updated_at.is_some());
        assert_eq!(mock.calls(Endpoint::Departures), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_then_timed_retry() {
        let mock = mock_with_boards().await;
        mock.fail_with_status(Endpoint::Departures, 503).await;
        let sub = start(&mock, "UT");

        let mut rx = sub.watch();
        wait_for_state(&mut rx, LoadState::Failed).await;
        let failed = sub.snapshot();
        assert!(failed.data.is_empty());
        assert!(failed.error_message.as_deref().unwrap().contains("503"));

        mock.clear_failures().await;
        time::sleep(Duration::from_secs(31)).await;

        let snapshot = sub.snapshot();
        assert_eq!(snapshot.state, LoadState::Ready);
        assert!(snapshot.error_message.is_none());
        assert_eq!(mock.calls(Endpoint::Departures), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_keeps_previous_data() {
        let mock = mock_with_boards().await;
        let sub = start(&mock, "UT");
        let mut rx = sub.watch();
        wait_for_state(&mut rx, LoadState::Ready).await;
        let first_update = sub.snapshot().last_updated_at;

        mock.fail_with_status(Endpoint::Departures, 500).await;
        time::sleep(Duration::from_secs(31)).await;

        let snapshot = sub.snapshot();
        assert_eq!(mock.calls(Endpoint::Departures), 2);
        assert_eq!(snapshot.state, LoadState::Ready);
        assert_eq!(snapshot.data.len(), 2);
        assert!(snapshot.error_message.is_none());
        assert_eq!(snapshot.last_updated_at, first_update);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_on_interval() {
        let mock = mock_with_boards().await;
        let _sub = start(&mock, "UT");

        time::sleep(Duration::from_secs(95)).await;
        // t = 0, 30, 60, 90
        assert_eq!(mock.calls(Endpoint::Departures), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_interval() {
        let mock = mock_with_boards().await;
        let _sub = Subscription::start(
            Arc::new(mock.clone()),
            BoardFeed::departures(code("UT")),
            PollConfig::every(Duration::from_secs(10)),
        );

        time::sleep(Duration::from_secs(35)).await;
        assert_eq!(mock.calls(Endpoint::Departures), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_never_overlaps() {
        let mock = mock_with_boards().await;
        mock.set_delay(&code("UT"), Duration::from_secs(45)).await;
        let _sub = start(&mock, "UT");

        // Fetches start at t = 0 and t = 75; the tick at 30 is skipped.
        time::sleep(Duration::from_secs(100)).await;
        assert_eq!(mock.calls(Endpoint::Departures), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn switch_discards_slow_response() {
        let mock = mock_with_boards().await;
        mock.set_delay(&code("UT"), Duration::from_secs(10)).await;
        let mut sub = start(&mock, "UT");

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(mock.calls(Endpoint::Departures), 1);
        sub.change_station(code("ASD"));
        assert!(sub.snapshot().is_first_load());

        let mut rx = sub.watch();
        wait_for_state(&mut rx, LoadState::Ready).await;
        time::sleep(Duration::from_secs(20)).await;

        let snapshot = sub.snapshot();
        assert_eq!(snapshot.state, LoadState::Ready);
        assert_eq!(snapshot.data[0].destination_name, "Rotterdam Centraal");
        assert_eq!(sub.feed().station, code("ASD"));
    }

    #[tokio::test(start_paused = true)]
    async fn change_to_same_station_is_a_noop() {
        let mock = mock_with_boards().await;
        let mut sub = start(&mock, "UT");
        let mut rx = sub.watch();
        wait_for_state(&mut rx, LoadState::Ready).await;

        sub.change_station(code("UT"));
        assert_eq!(sub.snapshot().state, LoadState::Ready);
        assert_eq!(mock.calls(Endpoint::Departures), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_mode_polls_arrivals() {
        let mock = mock_with_boards().await;
        let mut sub = start(&mock, "UT");
        let mut rx = sub.watch();
        wait_for_state(&mut rx, LoadState::Ready).await;

        sub.toggle_mode();
        assert_eq!(sub.feed().mode, BoardMode::Arrivals);
        wait_for_state(&mut rx, LoadState::Ready).await;

        let snapshot = sub.snapshot();
        assert_eq!(snapshot.data.len(), 1);
        assert_eq!(snapshot.data[0].destination_name, "Den Helder");
        assert_eq!(mock.calls(Endpoint::Arrivals), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unsubscribe_stops_polling() {
        let mock = mock_with_boards().await;
        let sub = start(&mock, "UT");
        let mut rx = sub.watch();
        wait_for_state(&mut rx, LoadState::Ready).await;

        sub.unsubscribe();
        time::sleep(Duration::from_secs(120)).await;
        assert_eq!(mock.calls(Endpoint::Departures), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_polling() {
        let mock = mock_with_boards().await;
        {
            let sub = start(&mock, "UT");
            let mut rx = sub.watch();
            wait_for_state(&mut rx, LoadState::Ready).await;
        }
        time::sleep(Duration::from_secs(120)).await;
        assert_eq!(mock.calls(Endpoint::Departures), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_refresh() {
        let mock = mock_with_boards().await;
        let sub = start(&mock, "UT");
        assert!(!sub.refresh_now());

        let mut rx = sub.watch();
        wait_for_state(&mut rx, LoadState::Ready).await;
        assert!(sub.refresh_now());

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(mock.calls(Endpoint::Departures), 2);
        assert_eq!(sub.snapshot().state, LoadState::Ready);

        // The timer restarts after every fetch.
        time::sleep(Duration::from_secs(25)).await;
        assert_eq!(mock.calls(Endpoint::Departures), 2);
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(mock.calls(Endpoint::Departures), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_request_is_not_retried_on_timer() {
        let mock = mock_with_boards().await;
        let sub = Subscription::start(
            Arc::new(mock.clone()),
            VehicleFeed::new(VehicleQuery::around(52.0, 5.0).with_limit(0)),
            PollConfig::default(),
        );
        let mut rx = sub.watch();
        wait_for_state(&mut rx, LoadState::Failed).await;
        let message = sub.snapshot().error_message.unwrap();
        assert!(message.contains("limit"));

        time::sleep(Duration::from_secs(120)).await;
        assert_eq!(sub.snapshot().state, LoadState::Failed);
        assert_eq!(mock.calls(Endpoint::Vehicles), 0);

        assert!(sub.refresh_now());
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(sub.snapshot().state, LoadState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn vehicle_feed() {
        let mock = MockTransitClient::new();
        mock.set_vehicles(json!({"payload": {"treinen": [
            {"ritId": "2025_IC_1234", "treinNummer": 1234, "lat": 52.09, "lng": 5.11, "snelheid": 88.5}
        ]}}))
        .await;

        let sub = Subscription::start(
            Arc::new(mock.clone()),
            VehicleFeed::new(VehicleQuery::around(52.09, 5.11)),
            PollConfig::default(),
        );
        let mut rx = sub.watch();
        wait_for_state(&mut rx, LoadState::Ready).await;

        let snapshot = sub.snapshot();
        assert_eq!(snapshot.data.len(), 1);
        assert_eq!(snapshot.data[0].composite_id, "1234-2025_IC_1234");
        assert_eq!(mock.calls(Endpoint::Vehicles), 1);
    }

    #[tokio::test]
    async fn stale_results_are_discarded() {
        let (snapshot, _) = watch::channel(Snapshot::idle());
        let shared = Arc::new(Shared {
            snapshot,
            generation: AtomicU64::new(1),
        });
        let worker = Worker {
            api: Arc::new(MockTransitClient::new()),
            feed: BoardFeed::departures(code("UT")),
            shared: Arc::clone(&shared),
            generation: 0,
        };

        assert_eq!(worker.begin(), None);
        assert_eq!(worker.apply(LoadState::Loading, Ok(Vec::new())), None);
        let after = shared.snapshot.borrow().clone();
        assert_eq!(after.state, LoadState::Idle);
        assert!(after.last_updated_at.is_none());
    }
}
