use crate::dashboard::{Command, Refresher, View};
use crate::gateway::SplitQrApi;
use crate::model::Overview;
use crate::util::time;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio::{pin, select};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Everything the views render from.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub view: View,
    pub loading: bool,
    /// set by a failed fetch, cleared by the next successful one
    pub error: Option<String>,
    pub snapshot: Option<Overview>,
    pub last_refreshed: Option<DateTime<Utc>>,
}

impl DashboardState {
    /// one line describing the fetch state, shown above every view
    pub fn status_line(&self) -> String {
        match (&self.error, self.loading, self.last_refreshed) {
            (Some(e), _, _) => format!("error: {e} (retry with `r`)"),
            (None, true, _) => "loading...".to_string(),
            (None, false, Some(at)) => format!("updated {}", at.format("%H:%M:%S")),
            (None, false, None) => "not loaded yet".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    Failed,
    /// another fetch was in flight; it will run once more on this caller's behalf
    Coalesced,
}

/// View router holding the selected view and the polled overview snapshot.
pub struct Dashboard<G: SplitQrApi> {
    gateway: Arc<G>,
    state: watch::Sender<DashboardState>,
    in_flight: AtomicBool,
    rerun: AtomicBool,
}

/// Releases the in-flight flag and clears `loading` even when the fetching future is dropped.
struct InFlight<'a> {
    flag: &'a AtomicBool,
    state: &'a watch::Sender<DashboardState>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        self.state
            .send_if_modified(|s| std::mem::replace(&mut s.loading, false));
    }
}

impl<G: SplitQrApi> Dashboard<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        let (state, _) = watch::channel(DashboardState::default());
        Self {
            gateway,
            state,
            in_flight: AtomicBool::new(false),
            rerun: AtomicBool::new(false),
        }
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    pub fn select_view(&self, view: View) {
        self.state.send_if_modified(|s| {
            let changed = s.view != view;
            s.view = view;
            changed
        });
    }

    /// Fetch the overview snapshot.
    ///
    /// At most one overview fetch runs at a time. A call made while one is in flight
    /// returns [`RefreshOutcome::Coalesced`] and the running fetch repeats once more
    /// after it completes, so mutations made before the call are always picked up.
    /// If the fetching future is dropped before that rerun, the pending rerun is kept
    /// and served by the next call.
    pub async fn refresh(&self) -> RefreshOutcome {
        let mut last = None;
        loop {
            if self.in_flight.swap(true, Ordering::AcqRel) {
                self.rerun.store(true, Ordering::Release);
                debug!("overview fetch already in flight, coalescing");
                return last.unwrap_or(RefreshOutcome::Coalesced);
            }
            let guard = InFlight {
                flag: &self.in_flight,
                state: &self.state,
            };
            let outcome = loop {
                let outcome = self.fetch_and_apply().await;
                if !self.rerun.swap(false, Ordering::AcqRel) {
                    break outcome;
                }
            };
            drop(guard);
            last = Some(outcome);
            // a caller may have flagged a rerun between the last check and the release
            if !self.rerun.swap(false, Ordering::AcqRel) {
                return outcome;
            }
        }
    }

    async fn fetch_and_apply(&self) -> RefreshOutcome {
        self.state.send_modify(|s| s.loading = true);
        match self.gateway.fetch_overview().await {
            Ok(overview) => {
                for account in overview
                    .accounts
                    .iter()
                    .filter(|a| a.pending != a.outstanding())
                {
                    warn!(
                        "account={} reports pending={} but total-paid={}",
                        account.id,
                        account.pending,
                        account.outstanding()
                    );
                }
                let now = time::helper::get_utc_now();
                // the selected view is never touched by a refresh
                self.state.send_modify(|s| {
                    s.snapshot = Some(overview);
                    s.error = None;
                    s.loading = false;
                    s.last_refreshed = Some(now);
                });
                RefreshOutcome::Applied
            }
            Err(e) => {
                warn!("overview fetch failed, {}", e);
                self.state.send_modify(|s| {
                    s.error = Some(e.to_string());
                    s.loading = false;
                });
                RefreshOutcome::Failed
            }
        }
    }

    /// Manual retry after a failed fetch.
    pub async fn retry(&self) -> RefreshOutcome {
        info!("retrying overview fetch");
        self.refresh().await
    }

    /// Apply a command typed into the dashboard. Returns `false` once the user quits.
    pub async fn dispatch(&self, command: Command) -> bool {
        match command {
            Command::Retry => {
                self.retry().await;
            }
            Command::Show(view) => self.select_view(view),
            Command::Quit => return false,
        }
        true
    }

    async fn poll(self: Arc<Self>, period: Duration, cancel_token: CancellationToken) {
        let interval = tokio::time::interval(period); // first tick fires immediately
        pin!(interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            select! {
                _ = interval.tick() => {},
                _ = cancel_token.cancelled() => {
                    info!("received cancel signal, stop polling");
                    return;
                }
            }
            // a fetch that already started runs to completion, coalesced reruns included
            self.refresh().await;
        }
    }

    /// Start the polling loop: fetch now, then every `period` until `cancel_token` fires.
    ///
    /// Wait on the returned tracker after cancelling to tear the loop down. A fetch in
    /// flight when the token fires finishes before the loop exits.
    pub fn start_polling(self: &Arc<Self>, period: Duration, cancel_token: CancellationToken) -> TaskTracker {
        let tracker = TaskTracker::new();
        tracker.spawn(self.clone().poll(period, cancel_token));
        tracker.close();
        tracker
    }
}

impl<G: SplitQrApi> Refresher for Dashboard<G> {
    async fn request_refresh(&self) {
        self.refresh().await;
    }
}
