//! Output formatting module

pub mod human;
pub mod json;
pub mod progress;
pub mod sink;
pub mod styles;

use anyhow::Result;
use console::Term;
use gateway_common::DomainConfig;
use owo_colors::OwoColorize as _;

use crate::application::services::dns::DnsReport;
use crate::application::services::orchestrator::GatewayStatus;
use crate::domain::env_file::EnvironmentConfig;
pub use human::HumanRenderer;
pub use json::JsonRenderer;
pub use sink::{CliSink, JsonLineSink, TerminalSink};
pub use styles::Styles;

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Check if progress indicators should be shown.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    /// Print a success message prefixed with `✓`. Suppressed when `quiet`.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// Print a warning message prefixed with `⚠`. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    /// Print an error message prefixed with `✗` to stderr. Never suppressed.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    /// Print an info message prefixed with `ℹ`. Suppressed when `quiet`.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "ℹ".style(self.styles.info));
        }
    }

    /// Print a section header. Suppressed when `quiet`.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Print a key-value pair with the key dimmed. Suppressed when `quiet`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }
}

/// Output rendering dispatch for the current mode.
pub enum Renderer<'a> {
    Human(HumanRenderer<'a>),
    Json(JsonRenderer),
}

impl Renderer<'_> {
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_status(&self, status: &GatewayStatus) -> Result<()> {
        match self {
            Self::Human(h) => {
                h.render_status(status);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::print(&JsonRenderer::status(status)),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_domain(&self, domain: Option<&DomainConfig>) -> Result<()> {
        match self {
            Self::Human(h) => {
                h.render_domain(domain);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::print(&JsonRenderer::domain(domain)),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_env(&self, env: &EnvironmentConfig) -> Result<()> {
        match self {
            Self::Human(h) => {
                h.render_env(env);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::print(&JsonRenderer::env(env)),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_dns_report(&self, report: &DnsReport) -> Result<()> {
        match self {
            Self::Human(h) => {
                h.render_dns_report(report);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::print(&JsonRenderer::dns_report(report)),
        }
    }
}
