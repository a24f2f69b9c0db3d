use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Domain settings persisted to `<node_dir>/.domain` and exchanged with the UI.
///
/// `api_user` and `api_key` are present if and only if `use_registrar_api`
/// is set. [`DomainConfig::validate`] enforces this; [`DomainConfig::normalized`]
/// drops stray credentials when the registrar is disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainConfig {
    /// Fully qualified bare domain, e.g. `example.com`.
    pub fqdn: String,
    /// Whether DNS records are managed through the registrar API.
    #[serde(alias = "isNamecheap")]
    pub use_registrar_api: bool,
    /// Registrar API user name.
    #[serde(default, alias = "username", skip_serializing_if = "Option::is_none")]
    pub api_user: Option<String>,
    /// Registrar API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainConfigError {
    #[error("domain name is empty")]
    EmptyFqdn,

    #[error("'{0}' is not a valid domain name: expected at least <name>.<tld>")]
    InvalidFqdn(String),

    #[error("registrar API is enabled but no API key was provided")]
    MissingApiKey,

    #[error("registrar API is enabled but no API user was provided")]
    MissingApiUser,

    #[error("registrar API credentials were provided but the registrar API is disabled")]
    UnexpectedCredentials,
}

impl DomainConfig {
    /// Drop credentials when the registrar API is disabled and trim whitespace.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.fqdn = self.fqdn.trim().trim_end_matches('.').to_ascii_lowercase();
        if self.use_registrar_api {
            self.api_user = self.api_user.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
            self.api_key = self.api_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
        } else {
            self.api_user = None;
            self.api_key = None;
        }
        self
    }

    /// Check the presence invariant and the domain shape.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), DomainConfigError> {
        if self.fqdn.is_empty() {
            return Err(DomainConfigError::EmptyFqdn);
        }
        let labels: Vec<&str> = self.fqdn.split('.').collect();
        let label_ok = |l: &&str| {
            !l.is_empty()
                && l.len() <= 63
                && !l.starts_with('-')
                && !l.ends_with('-')
                && l.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        };
        if labels.len() < 2 || !labels.iter().all(label_ok) {
            return Err(DomainConfigError::InvalidFqdn(self.fqdn.clone()));
        }
        match (self.use_registrar_api, &self.api_user, &self.api_key) {
            (true, _, None) => Err(DomainConfigError::MissingApiKey),
            (true, None, Some(_)) => Err(DomainConfigError::MissingApiUser),
            (false, Some(_), _) | (false, _, Some(_)) => {
                Err(DomainConfigError::UnexpectedCredentials)
            }
            _ => Ok(()),
        }
    }

    /// Registrar credentials, when the registrar API is enabled.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if !self.use_registrar_api {
            return None;
        }
        Some((self.api_user.as_deref()?, self.api_key.as_deref()?))
    }

    /// Copy with the API key masked, for display and logging.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            api_key: self.api_key.as_ref().map(|_| "********".to_string()),
            ..self.clone()
        }
    }
}
