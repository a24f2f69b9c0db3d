use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainConfig;

/// Which lifecycle button the front-end should offer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ButtonState {
    /// Every managed container is stopped; offer "start".
    Start,
    /// The full service group is running; offer "stop".
    Stop,
}

/// Severity attached to a `log-line` event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Warn,
    Error,
}

/// One environment variable as sent by the front-end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

/// Commands accepted on the UI channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum UiCommand {
    InstallRuntime,
    StartGateway,
    StopGateway,
    SaveEnv {
        vars: Vec<EnvVar>,
    },
    SaveDomain {
        domain: DomainConfig,
    },
    DeployProxy,
    LoadWalletFile {
        path: String,
    },
    /// Answer to a `confirmation-request` event.
    Confirm {
        id: u64,
        accepted: bool,
    },
    /// Accept or reject a pending manifest update.
    ConfirmManifest {
        accepted: bool,
        pending: String,
    },
}

/// Events emitted on the UI channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum UiEvent {
    RuntimeStatus {
        message: String,
        installed: bool,
        daemon_running: bool,
    },
    InstallComplete,
    LogLine {
        level: LogLevel,
        message: String,
        at: DateTime<Utc>,
        /// Failure classification, set on error lines only.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
    },
    ButtonState {
        state: ButtonState,
    },
    DomainLoaded {
        domain: Option<DomainConfig>,
    },
    ConfirmationRequest {
        id: u64,
        title: String,
        message: String,
    },
    /// A newer manifest was downloaded and awaits `confirm-manifest`.
    ManifestUpdateAvailable {
        pending: String,
    },
}

impl UiEvent {
    /// Build a `log-line` event stamped with the current time.
    #[must_use]
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::LogLine {
            level,
            message: message.into(),
            at: Utc::now(),
            kind: None,
        }
    }

    /// Build an error `log-line` carrying the failure's classification code.
    #[must_use]
    pub fn failure(message: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::LogLine {
            level: LogLevel::Error,
            message: message.into(),
            at: Utc::now(),
            kind: Some(kind.into()),
        }
    }
}
