//! Application context: state shared by every command handler.
//!
//! Loads the config once, resolves the node layout and builds the
//! front-end pieces (sink, confirmer, renderer) every command shares.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::{ConfigStore, Confirmer, EventSink};
use crate::application::services::orchestrator::Orchestrator;
use crate::domain::config::{GatewayConfig, GatewayPaths};
use crate::infra::system::SystemCapabilities;
use crate::output::{CliSink, HumanRenderer, JsonRenderer, OutputContext, Renderer};

/// Environment variables that switch off prompts.
const NON_INTERACTIVE_ENV: [&str; 2] = ["CI", "GATEWAY_YES"];

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Answer yes to every prompt.
    pub yes: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    pub output: OutputFlags,
    pub behaviour: BehaviourFlags,
}

/// Production orchestrator as the commands drive it.
pub type CliOrchestrator<'a, S> = Orchestrator<SystemCapabilities<TerminalConfirmer<'a>, S>>;

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    pub config: GatewayConfig,
    /// Where the config was read from, shown by `status`.
    pub config_path: PathBuf,
    pub paths: GatewayPaths,
    /// When `true`, never prompt.
    ///
    /// Set when `--yes` / `-y` is passed, or when the `CI` or `GATEWAY_YES`
    /// environment variables are present.
    pub non_interactive: bool,
    /// Answer given to prompts when `non_interactive`. Only `--yes` accepts;
    /// a bare CI environment declines.
    pub assume_yes: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is unreadable or the home
    /// directory cannot be determined.
    pub fn new(flags: &AppFlags, store: &impl ConfigStore) -> Result<Self> {
        let config = store.load()?;
        let config_path = store.path()?;
        let home = dirs::home_dir().context("cannot determine home directory")?;
        let paths = GatewayPaths::new(config.node_dir_in(&home));

        let env_non_interactive = NON_INTERACTIVE_ENV
            .iter()
            .any(|k| std::env::var_os(k).is_some());
        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };

        Ok(Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            mode,
            config,
            config_path,
            paths,
            non_interactive: flags.behaviour.yes || env_non_interactive,
            assume_yes: flags.behaviour.yes,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Event sink for one-shot commands. JSON mode streams events to
    /// stderr so stdout carries only the result document.
    #[must_use]
    pub fn sink(&self) -> CliSink<'_> {
        match self.mode {
            OutputMode::Human => CliSink::terminal(&self.output),
            OutputMode::Json => CliSink::json_stderr(),
        }
    }

    #[must_use]
    pub fn confirmer(&self) -> TerminalConfirmer<'_> {
        TerminalConfirmer { app: self }
    }

    /// The gatewayctl binary mounted into the proxy container.
    ///
    /// Without a configured path the running executable is used, but only
    /// on Linux hosts: the proxy image cannot run other builds.
    ///
    /// # Errors
    ///
    /// Returns an error if the running executable cannot be located.
    pub fn hook_binary(&self) -> Result<Option<PathBuf>> {
        if let Some(path) = &self.config.hook_binary {
            return Ok(Some(path.clone()));
        }
        if !cfg!(target_os = "linux") {
            tracing::debug!("no hook binary configured on a non-Linux host");
            return Ok(None);
        }
        std::env::current_exe()
            .map(Some)
            .context("cannot locate the gatewayctl executable")
    }

    /// Wire the production capabilities around `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the hook
    /// binary cannot be located.
    pub fn orchestrator<S: EventSink>(&self, sink: S) -> Result<CliOrchestrator<'_, S>> {
        let caps = SystemCapabilities::new(self.confirmer(), sink)?;
        Ok(Orchestrator::new(
            caps,
            self.config.clone(),
            self.paths.clone(),
            self.hook_binary()?,
        ))
    }
}

/// Prompts on the terminal, or answers for the operator when prompts are
/// switched off.
pub struct TerminalConfirmer<'a> {
    app: &'a AppContext,
}

impl Confirmer for TerminalConfirmer<'_> {
    async fn confirm(&self, title: &str, message: &str) -> Result<bool> {
        if self.app.non_interactive {
            let answer = self.app.assume_yes;
            tracing::info!(title, answer, "prompt answered non-interactively");
            return Ok(self.app.assume_yes);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("{title}: {message}"))
            .default(false)
            .interact()?;
        Ok(confirmed)
    }
}
