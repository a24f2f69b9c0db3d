//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::path::PathBuf;
use std::process::Output;

use serde::Serialize;
use thiserror::Error;

// ── Taxonomy ──────────────────────────────────────────────────────────────────

/// Stable classification of a failure, used in JSON output and to pick the
/// wording shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A dependency (runtime, daemon) is absent.
    Unavailable,
    /// A download, API call or DNS query failed with a known outcome.
    Transport,
    /// Local configuration differs from its remote source.
    Drift,
    /// A spawned process exited non-zero.
    ExternalToolFailure,
    /// An operation ran past its deadline; the outcome is unknown.
    Timeout,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Transport => "transport",
            Self::Drift => "drift",
            Self::ExternalToolFailure => "external_tool_failure",
            Self::Timeout => "timeout",
        }
    }
}

/// Cross-cutting gateway errors, one variant per [`ErrorKind`].
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{what} is not available. {remedy}")]
    Unavailable { what: String, remedy: String },

    #[error("{context}: {message}")]
    Transport { context: String, message: String },

    #[error("{what} differs from the published version (pending copy at {})", .pending.display())]
    Drift { what: String, pending: PathBuf },

    #[error("{tool} failed{}: {stderr}", .code.map(|c| format!(" with exit code {c}")).unwrap_or_default())]
    ExternalToolFailure {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{operation} timed out after {secs}s; its outcome is unknown")]
    Timeout { operation: String, secs: u64 },
}

impl GatewayError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unavailable { .. } => ErrorKind::Unavailable,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Drift { .. } => ErrorKind::Drift,
            Self::ExternalToolFailure { .. } => ErrorKind::ExternalToolFailure,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// Build an `ExternalToolFailure` from a finished process.
    ///
    /// Falls back to stdout when stderr is empty so the message is never blank.
    #[must_use]
    pub fn tool_failed(tool: &str, output: &Output) -> Self {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stderr = if stderr.is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr
        };
        Self::ExternalToolFailure {
            tool: tool.to_string(),
            code: output.status.code(),
            stderr,
        }
    }

    pub fn transport(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            context: context.into(),
            message: message.into(),
        }
    }
}

// ── Component errors ──────────────────────────────────────────────────────────

/// Container runtime errors. Install and daemon-start failures are distinct.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("The container runtime is not installed. Run 'gatewayctl install-runtime' to install it.")]
    NotInstalled,

    #[error("Container runtime installation failed: {0}")]
    InstallFailed(String),

    #[error("The container runtime daemon did not start: {0}")]
    DaemonStartFailed(String),
}

impl RuntimeError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotInstalled | Self::DaemonStartFailed(_) => ErrorKind::Unavailable,
            Self::InstallFailed(_) => ErrorKind::ExternalToolFailure,
        }
    }
}

/// Orchestration manifest errors.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to download the compose manifest: {0}")]
    DownloadFailed(String),

    #[error("No network is declared in {}", .0.display())]
    NoNetwork(PathBuf),
}

/// Reverse-proxy deployment errors.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("No domain is configured. Save one first: gatewayctl domain set <fqdn>")]
    NoDomain,

    #[error("Certificate issuance requires registrar API credentials for {0}")]
    NoCredentials(String),

    #[error(
        "No Linux gatewayctl binary is available for the certificate hooks. \
         Set hook_binary in the config file to a Linux build."
    )]
    NoHookBinary,

    /// `kind` is the classification of the cause that stopped the stage.
    #[error("Proxy deployment stopped at stage '{stage}': {reason}")]
    StageFailed {
        stage: &'static str,
        reason: String,
        kind: ErrorKind,
    },
}

impl ProxyError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoDomain | Self::NoCredentials(_) | Self::NoHookBinary => ErrorKind::Unavailable,
            Self::StageFailed { kind, .. } => *kind,
        }
    }
}

/// Environment file errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    #[error("'{0}' is not a valid environment variable name")]
    InvalidKey(String),

    #[error("the value for {0} spans more than one line")]
    MultilineValue(String),
}

/// DNS-01 challenge errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChallengeError {
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("TXT record for {name} did not propagate after {attempts} attempts")]
    PropagationTimeout { name: String, attempts: u32 },
}

/// Registrar API errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrarError {
    #[error("registrar API rejected the request: {0}")]
    Api(String),

    #[error("unexpected registrar response: {0}")]
    Malformed(String),

    #[error("'{0}' cannot be split into a second-level domain and a TLD")]
    UnsupportedDomain(String),
}

/// Wallet key file errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("wallet file is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("wallet file has no RSA modulus ('n')")]
    MissingModulus,

    #[error("wallet modulus is not valid base64url")]
    InvalidModulus,
}

/// Walk an error chain and return the first recognised classification.
///
/// Errors carrying no typed cause are treated as `Transport`.
#[must_use]
pub fn classify(err: &anyhow::Error) -> ErrorKind {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<GatewayError>() {
            return e.kind();
        }
        if let Some(e) = cause.downcast_ref::<RuntimeError>() {
            return e.kind();
        }
        if let Some(e) = cause.downcast_ref::<ProxyError>() {
            return e.kind();
        }
        if cause.downcast_ref::<ManifestError>().is_some()
            || cause.downcast_ref::<RegistrarError>().is_some()
        {
            return ErrorKind::Transport;
        }
        if matches!(
            cause.downcast_ref::<ChallengeError>(),
            Some(ChallengeError::PropagationTimeout { .. })
        ) {
            return ErrorKind::Timeout;
        }
    }
    ErrorKind::Transport
}
