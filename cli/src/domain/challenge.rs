//! DNS-01 challenge hook contract.
//!
//! The certificate tool runs the hooks inside the proxy container with the
//! challenge in `CERTBOT_*` variables. gatewayctl adds the registrar
//! credentials and the public address as `GATEWAY_*` variables when it
//! launches the tool.

use std::net::Ipv4Addr;
use std::time::Duration;

use crate::domain::error::ChallengeError;

pub const ENV_DOMAIN: &str = "CERTBOT_DOMAIN";
pub const ENV_VALIDATION: &str = "CERTBOT_VALIDATION";
pub const ENV_REGISTRAR_USER: &str = "GATEWAY_REGISTRAR_USER";
pub const ENV_REGISTRAR_KEY: &str = "GATEWAY_REGISTRAR_KEY";
pub const ENV_CLIENT_IP: &str = "GATEWAY_CLIENT_IP";

/// Fixed polling schedule for TXT propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    /// Wait after publishing before the first lookup.
    pub settle: Duration,
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(30),
            interval: Duration::from_secs(30),
            max_attempts: 20,
        }
    }
}

/// Registrar credentials as forwarded to the hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrarCredentials {
    pub api_user: String,
    pub api_key: String,
    /// Public IPv4 the registrar whitelists API calls by.
    pub client_ip: Ipv4Addr,
}

/// Everything one hook invocation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookRequest {
    /// Name being validated, without any `*.` prefix.
    pub domain: String,
    /// Token to publish. Empty for the cleanup hook when the tool omits it.
    pub validation: String,
    pub credentials: RegistrarCredentials,
}

impl HookRequest {
    /// Read a request from an environment lookup.
    ///
    /// `require_validation` is false for the cleanup hook.
    ///
    /// # Errors
    ///
    /// Returns `MissingEnv` naming the first absent or empty variable.
    pub fn from_env(
        lookup: impl Fn(&str) -> Option<String>,
        require_validation: bool,
    ) -> Result<Self, ChallengeError> {
        let get = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ChallengeError::MissingEnv(key))
        };
        let domain = get(ENV_DOMAIN)?;
        let validation = if require_validation {
            get(ENV_VALIDATION)?
        } else {
            get(ENV_VALIDATION).unwrap_or_default()
        };
        let client_ip = get(ENV_CLIENT_IP)?
            .parse()
            .map_err(|_| ChallengeError::MissingEnv(ENV_CLIENT_IP))?;
        Ok(Self {
            domain: domain.trim_start_matches("*.").to_string(),
            validation,
            credentials: RegistrarCredentials {
                api_user: get(ENV_REGISTRAR_USER)?,
                api_key: get(ENV_REGISTRAR_KEY)?,
                client_ip,
            },
        })
    }

    /// Fully qualified name of the TXT record.
    #[must_use]
    pub fn record_name(&self) -> String {
        format!("_acme-challenge.{}", self.domain)
    }
}

/// Whether a TXT lookup contains the expected token. Quoting and whitespace
/// from `dig +short` are ignored.
#[must_use]
pub fn txt_matches(values: &[String], expected: &str) -> bool {
    values
        .iter()
        .any(|v| v.trim().trim_matches('"') == expected)
}
