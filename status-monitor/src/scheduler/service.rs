//! Polling loop.
//!
//! The scheduler alternates between `Waiting` and `Polling`. Each cycle
//! fetches a snapshot, compares it with the last good one, formats and sends
//! the resulting notifications, then sleeps for the configured interval.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::error::FetchError;
use crate::monitor::{ChangeDetector, Snapshot, StatusFetcher, StatusSource};
use crate::notification::{
    MessageFormatter, NotificationChannel, NotificationPayload, WebhookChannel,
};
use crate::utils::http_client;

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Sleeping until the next cycle.
    Waiting,
    /// A cycle is in progress.
    Polling,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Polling => write!(f, "polling"),
        }
    }
}

/// Outcome of one polling cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// The status document was retrieved and parsed.
    pub fetched: bool,
    /// This was the first successful fetch.
    pub first_run: bool,
    pub transitions: usize,
    pub removed: usize,
    /// Payloads delivered.
    pub sent: usize,
    /// Payloads that failed to deliver.
    pub failed: usize,
}

/// Drives fetch, detect, format, notify, sleep.
pub struct Scheduler {
    source: Arc<dyn StatusSource>,
    channel: Arc<dyn NotificationChannel>,
    detector: ChangeDetector,
    formatter: MessageFormatter,
    check_interval: Duration,
    previous: Option<Snapshot>,
    state: SchedulerState,
    cycles: u64,
}

impl Scheduler {
    pub fn new(
        source: Arc<dyn StatusSource>,
        channel: Arc<dyn NotificationChannel>,
        detector: ChangeDetector,
        formatter: MessageFormatter,
        check_interval: Duration,
    ) -> Self {
        Self {
            source,
            channel,
            detector,
            formatter,
            check_interval,
            previous: None,
            state: SchedulerState::Waiting,
            cycles: 0,
        }
    }

    /// Wire up the HTTP fetcher and webhook channel described by `config`.
    pub fn from_config(config: &AppConfig) -> crate::Result<Self> {
        let client = http_client::build_client(config.request_timeout)?;

        let source = Arc::new(StatusFetcher::new(
            client.clone(),
            config.status_api_url.clone(),
        ));
        let channel = Arc::new(WebhookChannel::new(client, config.webhook_url.clone()));

        Ok(Self::new(
            source,
            channel,
            ChangeDetector::new(config.removed_components),
            MessageFormatter::new(
                config.payload_format,
                config.emoji_style,
                config.notify_on_first_run,
            ),
            config.check_interval,
        ))
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Last successfully fetched snapshot, the baseline for the next comparison.
    pub fn previous_snapshot(&self) -> Option<&Snapshot> {
        self.previous.as_ref()
    }

    /// Number of cycles started so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run one cycle. Fetch and delivery failures are logged, never returned.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.set_state(SchedulerState::Polling);
        self.cycles += 1;

        let report = match self.source.fetch().await {
            Ok(snapshot) => self.handle_snapshot(snapshot).await,
            Err(e) => self.handle_fetch_error(e).await,
        };

        self.set_state(SchedulerState::Waiting);
        report
    }

    /// Run one cycle, turning a panic into a no-op cycle.
    ///
    /// The previous snapshot is only replaced at the very end of a successful
    /// cycle, so a panic leaves the comparison baseline untouched.
    pub async fn run_cycle_guarded(&mut self) -> Option<CycleReport> {
        match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
            Ok(report) => Some(report),
            Err(panic) => {
                error!(
                    cycle = self.cycles,
                    panic = %panic_message(panic.as_ref()),
                    "Cycle aborted unexpectedly"
                );
                self.set_state(SchedulerState::Waiting);
                None
            }
        }
    }

    /// Poll until `cancel` fires. The first cycle starts immediately.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            source = %self.source.describe(),
            channel = self.channel.channel_type(),
            interval_secs = self.check_interval.as_secs(),
            "Status monitor started"
        );

        loop {
            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = self.run_cycle_guarded() => outcome,
            };

            if let Some(report) = outcome {
                info!(
                    cycle = self.cycles,
                    fetched = report.fetched,
                    first_run = report.first_run,
                    transitions = report.transitions,
                    removed = report.removed,
                    sent = report.sent,
                    failed = report.failed,
                    "Cycle complete"
                );
            }

            debug!(
                "Waiting {}s for next check",
                self.check_interval.as_secs()
            );
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.check_interval) => {}
            }
        }

        info!(cycles = self.cycles, "Status monitor stopped");
    }

    async fn handle_snapshot(&mut self, snapshot: Snapshot) -> CycleReport {
        info!(
            indicator = snapshot.overall_indicator(),
            description = snapshot.overall_description(),
            components = snapshot.components().len(),
            updated_at = ?snapshot.page().updated_at,
            "Status fetched"
        );

        let detection = self.detector.detect(self.previous.as_ref(), &snapshot);
        if detection.is_first_run {
            info!("Initial status obtained");
        }
        for transition in &detection.transitions {
            info!(
                component = %transition.component_name,
                from = %transition.previous_status,
                to = %transition.new_status,
                "Component status changed"
            );
        }
        for component in &detection.removed {
            info!(component = %component.name, "Component removed from feed");
        }

        let payloads = self.formatter.format_cycle(&snapshot, &detection);
        let (sent, failed) = self.deliver(&payloads).await;

        self.previous = Some(snapshot);

        CycleReport {
            fetched: true,
            first_run: detection.is_first_run,
            transitions: detection.transitions.len(),
            removed: detection.removed.len(),
            sent,
            failed,
        }
    }

    async fn handle_fetch_error(&mut self, error: FetchError) -> CycleReport {
        warn!(error = %error, "Failed to fetch status");

        let payload = self.formatter.format_fetch_error(&error);
        let (sent, failed) = self.deliver(std::slice::from_ref(&payload)).await;

        CycleReport {
            fetched: false,
            sent,
            failed,
            ..Default::default()
        }
    }

    async fn deliver(&self, payloads: &[NotificationPayload]) -> (usize, usize) {
        let mut sent = 0;
        let mut failed = 0;
        for payload in payloads {
            match self.channel.send(payload).await {
                Ok(()) => {
                    sent += 1;
                    debug!(kind = %payload.kind(), title = payload.title(), "Notification sent");
                }
                Err(e) => {
                    failed += 1;
                    warn!(
                        kind = %payload.kind(),
                        channel = self.channel.channel_type(),
                        error = %e,
                        "Failed to send notification"
                    );
                }
            }
        }
        (sent, failed)
    }

    fn set_state(&mut self, state: SchedulerState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "Scheduler state changed");
            self.state = state;
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
