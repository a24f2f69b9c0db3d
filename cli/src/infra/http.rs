//! HTTP infrastructure: implements `Downloader` and `PublicAddress` with
//! a shared `reqwest` client.

use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::application::ports::{Downloader, PublicAddress};
use crate::domain::error::GatewayError;

pub const PUBLIC_IP_URL: &str = "https://api.ipify.org";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
/// Longest silence tolerated between two reads of a response.
const READ_TIMEOUT: Duration = Duration::from_secs(60);
/// Ceiling on a whole download, body included.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30 * 60);
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the client every HTTP adapter shares.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("gatewayctl/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(CONNECT_TIMEOUT)
        .read_timeout(READ_TIMEOUT)
        .build()
        .context("building HTTP client")
}

/// Production HTTP adapter.
pub struct ReqwestHttp {
    client: reqwest::Client,
    public_ip_url: String,
}

impl ReqwestHttp {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            public_ip_url: PUBLIC_IP_URL.to_string(),
        }
    }
}

impl Downloader for ReqwestHttp {
    async fn download(&self, url: &str, dest: &Path) -> Result<u16> {
        let response = self
            .client
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| request_failed(format!("GET {url}"), DOWNLOAD_TIMEOUT, &e))?;
        let status = response.status().as_u16();
        debug!(url, status, "download response");
        if status != 200 {
            return Ok(status);
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("creating {}", dest.display()))?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| request_failed(format!("reading {url}"), READ_TIMEOUT, &e))?;
            file.write_all(&chunk)
                .await
                .with_context(|| format!("writing {}", dest.display()))?;
        }
        file.flush()
            .await
            .with_context(|| format!("flushing {}", dest.display()))?;
        Ok(status)
    }
}

impl PublicAddress for ReqwestHttp {
    async fn public_ipv4(&self) -> Result<Ipv4Addr> {
        let body = self
            .client
            .get(&self.public_ip_url)
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| request_failed("public address lookup", LOOKUP_TIMEOUT, &e))?
            .text()
            .await
            .map_err(|e| request_failed("public address lookup", LOOKUP_TIMEOUT, &e))?;
        parse_ipv4(&body)
    }
}

fn request_failed(
    operation: impl Into<String>,
    limit: Duration,
    err: &reqwest::Error,
) -> GatewayError {
    failure(operation.into(), limit, err.is_timeout(), err.to_string())
}

/// An expired deadline leaves the outcome unknown; anything else is transport.
fn failure(operation: String, limit: Duration, timed_out: bool, message: String) -> GatewayError {
    if timed_out {
        GatewayError::Timeout {
            operation,
            secs: limit.as_secs(),
        }
    } else {
        GatewayError::transport(operation, message)
    }
}

fn parse_ipv4(body: &str) -> Result<Ipv4Addr> {
    body.trim().parse().map_err(|_| {
        GatewayError::transport(
            "public address lookup",
            format!("unexpected response {:?}", body.trim()),
        )
        .into()
    })
}
