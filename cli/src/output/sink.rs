//! `EventSink` implementations for the two front-ends.
//!
//! `TerminalSink` prints events for an operator at a terminal, suspending
//! any active spinner. `JsonLineSink` writes one JSON `UiEvent` per line
//! for the out-of-process UI.

use std::cell::RefCell;
use std::io::Write;

use gateway_common::{ButtonState, LogLevel, UiEvent};
use indicatif::ProgressBar;
use tracing::{debug, warn};

use crate::application::ports::EventSink;
use crate::output::{OutputContext, progress};

/// Prints events through an `OutputContext`.
pub struct TerminalSink<'a> {
    ctx: &'a OutputContext,
    spinner: RefCell<Option<ProgressBar>>,
}

impl<'a> TerminalSink<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            spinner: RefCell::new(None),
        }
    }

    /// Show a spinner until [`Self::finish`] is called. No-op without a TTY.
    pub fn begin(&self, msg: &str) {
        if self.ctx.show_progress() {
            self.spinner.replace(Some(progress::spinner(msg)));
        } else {
            self.ctx.info(msg);
        }
    }

    /// Stop the spinner, marking the stage as passed or failed.
    pub fn finish(&self, ok: bool, msg: &str) {
        match self.spinner.take() {
            Some(pb) if ok => progress::finish_ok(&pb, msg),
            Some(pb) => progress::finish_error(&pb, msg),
            None if ok => self.ctx.success(msg),
            None => self.ctx.error(msg),
        }
    }

    fn print(&self, f: impl FnOnce()) {
        match self.spinner.borrow().as_ref() {
            Some(pb) => pb.suspend(f),
            None => f(),
        }
    }
}

impl EventSink for TerminalSink<'_> {
    fn emit(&self, event: UiEvent) {
        let ctx = self.ctx;
        match event {
            UiEvent::LogLine { level, message, .. } => self.print(|| match level {
                LogLevel::Info => ctx.info(&message),
                LogLevel::Warn => ctx.warn(&message),
                LogLevel::Error => ctx.error(&message),
            }),
            UiEvent::RuntimeStatus {
                message,
                daemon_running,
                ..
            } => self.print(|| {
                if daemon_running {
                    ctx.success(&message);
                } else {
                    ctx.warn(&message);
                }
            }),
            UiEvent::InstallComplete => self.print(|| ctx.success("Docker installation complete.")),
            UiEvent::ButtonState { state } => self.print(|| match state {
                ButtonState::Stop => ctx.kv("Gateway:", "running"),
                ButtonState::Start => ctx.kv("Gateway:", "stopped"),
            }),
            UiEvent::ManifestUpdateAvailable { pending } => self.print(|| {
                ctx.info(&format!("Pending manifest saved at {pending}."));
                ctx.info("Review it, then run: gatewayctl manifest apply");
            }),
            UiEvent::DomainLoaded { .. } => debug!("domain-loaded not shown on the terminal"),
            UiEvent::ConfirmationRequest { id, .. } => {
                debug!(id, "confirmation-request not shown on the terminal");
            }
        }
    }
}

/// Writes each event as a single JSON line and flushes.
pub struct JsonLineSink<W: Write> {
    out: RefCell<W>,
}

impl JsonLineSink<std::io::Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl JsonLineSink<std::io::Stderr> {
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write> JsonLineSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write> EventSink for JsonLineSink<W> {
    fn emit(&self, event: UiEvent) {
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "could not serialize event");
                return;
            }
        };
        let mut out = self.out.borrow_mut();
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            warn!(error = %e, "could not write event");
        }
    }
}

/// Sink chosen by the output mode of a one-shot command.
pub enum CliSink<'a> {
    Terminal(TerminalSink<'a>),
    Json(JsonLineSink<std::io::Stderr>),
}

impl<'a> CliSink<'a> {
    #[must_use]
    pub fn terminal(ctx: &'a OutputContext) -> Self {
        Self::Terminal(TerminalSink::new(ctx))
    }

    #[must_use]
    pub fn json_stderr() -> Self {
        Self::Json(JsonLineSink::stderr())
    }

    /// Spinner for a long stage. JSON mode has none.
    pub fn begin(&self, msg: &str) {
        if let Self::Terminal(t) = self {
            t.begin(msg);
        }
    }

    pub fn finish(&self, ok: bool, msg: &str) {
        if let Self::Terminal(t) = self {
            t.finish(ok, msg);
        }
    }
}

impl EventSink for CliSink<'_> {
    fn emit(&self, event: UiEvent) {
        match self {
            Self::Terminal(t) => t.emit(event),
            Self::Json(j) => j.emit(event),
        }
    }
}
