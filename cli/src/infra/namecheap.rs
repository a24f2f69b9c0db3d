//! Namecheap XML API client implementing `RegistrarApi`.
//!
//! Both commands are form POSTs. The API whitelists callers by `ClientIp`,
//! which must be this machine's public address.

use anyhow::{Context, Result};
use tracing::debug;

use crate::application::ports::RegistrarApi;
use crate::domain::challenge::RegistrarCredentials;
use crate::domain::error::GatewayError;
use crate::domain::registrar::{self, HostRecord, RegisteredDomain};

pub const NAMECHEAP_API_URL: &str = "https://api.namecheap.com/xml.response";

const GET_HOSTS: &str = "namecheap.domains.dns.getHosts";
const SET_HOSTS: &str = "namecheap.domains.dns.setHosts";

pub struct NamecheapClient {
    client: reqwest::Client,
    endpoint: String,
}

impl NamecheapClient {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: NAMECHEAP_API_URL.to_string(),
        }
    }

    async fn call(&self, params: Vec<(String, String)>) -> Result<String> {
        let command = params
            .iter()
            .find(|(k, _)| k == "Command")
            .map(|(_, v)| v.clone())
            .unwrap_or_default();
        debug!(%command, "registrar request");
        let response = self
            .client
            .post(&self.endpoint)
            .form(&params)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| GatewayError::transport(format!("registrar {command}"), e.to_string()))?;
        response
            .text()
            .await
            .with_context(|| format!("reading registrar {command} response"))
    }
}

/// Authentication and addressing parameters common to every command.
fn base_params(
    creds: &RegistrarCredentials,
    domain: &RegisteredDomain,
    command: &str,
) -> Vec<(String, String)> {
    [
        ("ApiUser", creds.api_user.as_str()),
        ("ApiKey", creds.api_key.as_str()),
        ("UserName", creds.api_user.as_str()),
        ("Command", command),
        ("SLD", domain.sld.as_str()),
        ("TLD", domain.tld.as_str()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .chain(std::iter::once((
        "ClientIp".to_string(),
        creds.client_ip.to_string(),
    )))
    .collect()
}

impl RegistrarApi for NamecheapClient {
    async fn get_hosts(
        &self,
        creds: &RegistrarCredentials,
        domain: &RegisteredDomain,
    ) -> Result<Vec<HostRecord>> {
        let xml = self.call(base_params(creds, domain, GET_HOSTS)).await?;
        Ok(registrar::parse_get_hosts(&xml)?)
    }

    async fn set_hosts(
        &self,
        creds: &RegistrarCredentials,
        domain: &RegisteredDomain,
        records: &[HostRecord],
    ) -> Result<()> {
        let mut params = base_params(creds, domain, SET_HOSTS);
        params.extend(registrar::set_hosts_params(records));
        let xml = self.call(params).await?;
        Ok(registrar::parse_set_hosts(&xml)?)
    }
}
