//! Host firewall adapters.
//!
//! Windows uses `netsh advfirewall`, Linux uses `ufw` when it is installed
//! and active. Anything else has no firewall gatewayctl manages, so every
//! port reports as allowed.

use std::time::Duration;

use anyhow::Result;
#[cfg(not(windows))]
use tracing::debug;

use crate::application::ports::{CommandRunner, Firewall};
use crate::domain::error::GatewayError;

const FIREWALL_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SystemFirewall<R> {
    runner: R,
}

impl<R: CommandRunner> SystemFirewall<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    #[cfg_attr(not(any(windows, target_os = "linux")), allow(dead_code))]
    async fn checked(&self, program: &str, args: &[&str]) -> Result<String> {
        let out = self
            .runner
            .run_with_timeout(program, args, FIREWALL_TIMEOUT)
            .await?;
        if !out.status.success() {
            return Err(GatewayError::tool_failed(program, &out).into());
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

#[cfg(windows)]
impl<R: CommandRunner> Firewall for SystemFirewall<R> {
    async fn has_rule(&self, port: u16) -> Result<bool> {
        let listing = self
            .checked(
                "netsh",
                &["advfirewall", "firewall", "show", "rule", "name=all", "dir=in"],
            )
            .await?;
        Ok(netsh_allows(&listing, port))
    }

    async fn allow_port(&self, port: u16, description: &str) -> Result<()> {
        let name = format!("name={description} {port}");
        let local_port = format!("localport={port}");
        self.checked(
            "netsh",
            &[
                "advfirewall",
                "firewall",
                "add",
                "rule",
                &name,
                "dir=in",
                "action=allow",
                "protocol=TCP",
                &local_port,
            ],
        )
        .await
        .map(|_| ())
    }
}

#[cfg(target_os = "linux")]
impl<R: CommandRunner> Firewall for SystemFirewall<R> {
    async fn has_rule(&self, port: u16) -> Result<bool> {
        let out = match self
            .runner
            .run_with_timeout("ufw", &["status"], FIREWALL_TIMEOUT)
            .await
        {
            Ok(out) => out,
            Err(e) => {
                debug!(error = %e, "ufw unavailable; no firewall to configure");
                return Ok(true);
            }
        };
        if !out.status.success() {
            return Err(GatewayError::tool_failed("ufw status", &out).into());
        }
        let listing = String::from_utf8_lossy(&out.stdout);
        Ok(!ufw_active(&listing) || ufw_allows(&listing, port))
    }

    async fn allow_port(&self, port: u16, description: &str) -> Result<()> {
        let rule = format!("{port}/tcp");
        self.checked("ufw", &["allow", &rule, "comment", description])
            .await
            .map(|_| ())
    }
}

#[cfg(not(any(windows, target_os = "linux")))]
impl<R: CommandRunner> Firewall for SystemFirewall<R> {
    async fn has_rule(&self, port: u16) -> Result<bool> {
        debug!(port, "no managed firewall on this platform");
        Ok(true)
    }

    async fn allow_port(&self, _port: u16, _description: &str) -> Result<()> {
        Ok(())
    }
}

/// Whether `netsh ... show rule` lists an inbound allow rule covering `port`.
/// Rules are blank-line separated blocks of `Key: Value` lines.
#[cfg_attr(not(windows), allow(dead_code))]
fn netsh_allows(listing: &str, port: u16) -> bool {
    listing.split("\r\n\r\n").flat_map(|b| b.split("\n\n")).any(|block| {
        let field = |key: &str| {
            block.lines().find_map(|l| {
                let (k, v) = l.split_once(':')?;
                (k.trim() == key).then(|| v.trim().to_string())
            })
        };
        let allows = field("Action").is_some_and(|a| a.eq_ignore_ascii_case("Allow"));
        let covers = field("LocalPort").is_some_and(|p| port_list_contains(&p, port));
        allows && covers
    })
}

/// Matches `80`, `80,443` and ranges like `8000-9000`.
fn port_list_contains(list: &str, port: u16) -> bool {
    list.split(',').map(str::trim).any(|item| match item.split_once('-') {
        Some((lo, hi)) => matches!(
            (lo.trim().parse::<u16>(), hi.trim().parse::<u16>()),
            (Ok(lo), Ok(hi)) if (lo..=hi).contains(&port)
        ),
        None => item.parse::<u16>() == Ok(port),
    })
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn ufw_active(listing: &str) -> bool {
    listing
        .lines()
        .any(|l| l.trim().eq_ignore_ascii_case("Status: active"))
}

/// Whether an `ALLOW` line in `ufw status` covers `port` over TCP.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn ufw_allows(listing: &str, port: u16) -> bool {
    listing.lines().any(|line| {
        let mut cols = line.split_whitespace();
        let (Some(target), Some(action)) = (cols.next(), cols.next()) else {
            return false;
        };
        if !action.eq_ignore_ascii_case("ALLOW") {
            return false;
        }
        let (ports, proto) = target.split_once('/').unwrap_or((target, "tcp"));
        proto.eq_ignore_ascii_case("tcp") && port_list_contains(&ports.replace(':', "-"), port)
    })
}
