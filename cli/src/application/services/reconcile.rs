//! Periodic read-only reconciliation of the container group with the UI.
//!
//! Each tick probes the runtime, lists the containers on the managed
//! network and tells the front-end which lifecycle button to offer. Ticks
//! never modify the env file or the manifest.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use gateway_common::{ButtonState, UiEvent};
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::application::ports::{CommandRunner, EventSink, LocalFs, RuntimeHost};
use crate::application::services::{compose, runtime};
use crate::application::services::runtime::InstallStatus;
use crate::domain::config::GatewayPaths;

/// What a single tick concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// An installation is running.
    Skipped,
    /// The runtime or its daemon is not usable.
    RuntimeUnavailable,
    /// The manifest names no network to watch.
    NoNetwork,
    /// Listing containers failed.
    ListFailed,
    Button(ButtonState),
    /// Containers are mid-transition; only a raw listing was logged.
    Transitional,
}

/// State carried between ticks so repeated conditions are reported once.
#[derive(Debug, Default)]
pub struct ReconcileMemo {
    last_button: Cell<Option<ButtonState>>,
    last_problem: RefCell<Option<String>>,
}

impl ReconcileMemo {
    /// Forget the last button so the next classification is re-sent.
    pub fn reset(&self) {
        self.last_button.set(None);
        self.last_problem.replace(None);
    }
}

/// Borrowed view of everything a tick needs.
pub struct Reconciler<'a, R, H, F, S> {
    pub runner: &'a R,
    pub host: &'a H,
    pub fs: &'a F,
    pub sink: &'a S,
    pub paths: &'a GatewayPaths,
    pub install: &'a InstallStatus,
    pub expected_services: usize,
    pub memo: &'a ReconcileMemo,
}

impl<R, H, F, S> Reconciler<'_, R, H, F, S>
where
    R: CommandRunner,
    H: RuntimeHost,
    F: LocalFs,
    S: EventSink,
{
    /// One reconciliation pass.
    pub async fn tick(&self) -> TickOutcome {
        if self.install.is_installing() {
            debug!("installation in progress, skipping reconciliation");
            return TickOutcome::Skipped;
        }

        if let Err(e) = runtime::ensure_ready(self.runner, self.host, self.sink).await {
            self.problem(&e.to_string());
            return TickOutcome::RuntimeUnavailable;
        }

        let network = match compose::network_name(self.fs, self.paths) {
            Ok(name) => name,
            Err(_) => {
                self.problem("No network name found in the compose manifest.");
                return TickOutcome::NoNetwork;
            }
        };

        let snapshot = match compose::list_containers(self.runner, &network).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.problem(&format!("Could not list containers: {e:#}"));
                return TickOutcome::ListFailed;
            }
        };
        self.memo.last_problem.replace(None);

        match snapshot.classify(self.expected_services) {
            Some(state) => {
                if self.memo.last_button.get() != Some(state) {
                    self.memo.last_button.set(Some(state));
                    self.sink.emit(UiEvent::ButtonState { state });
                }
                TickOutcome::Button(state)
            }
            None => {
                self.sink.info(&snapshot.render());
                TickOutcome::Transitional
            }
        }
    }

    /// Tick forever at `interval`. The first tick runs immediately.
    pub async fn run(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let outcome = self.tick().await;
            debug!(?outcome, "reconciliation tick");
        }
    }

    fn problem(&self, message: &str) {
        let mut last = self.memo.last_problem.borrow_mut();
        if last.as_deref() != Some(message) {
            self.sink.error(message);
            *last = Some(message.to_string());
        }
    }
}
