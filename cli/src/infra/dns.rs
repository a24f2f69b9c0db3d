//! DNS lookups: A records through the system resolver, TXT records
//! through `dig` so the check sees what public resolvers see.

use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use anyhow::Result;

use crate::application::ports::{CommandRunner, DnsResolver};
use crate::domain::error::GatewayError;

const DIG_TIMEOUT: Duration = Duration::from_secs(15);

pub struct SystemResolver<R> {
    runner: R,
}

impl<R: CommandRunner> SystemResolver<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> DnsResolver for SystemResolver<R> {
    async fn resolve_a(&self, host: &str) -> Result<Vec<Ipv4Addr>> {
        let addrs = tokio::net::lookup_host((host, 0))
            .await
            .map_err(|e| GatewayError::transport(format!("resolving {host}"), e.to_string()))?;
        let unique: BTreeSet<Ipv4Addr> = addrs
            .filter_map(|a| match a.ip() {
                IpAddr::V4(ip) => Some(ip),
                IpAddr::V6(_) => None,
            })
            .collect();
        Ok(unique.into_iter().collect())
    }

    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>> {
        let out = self
            .runner
            .run_with_timeout("dig", &["+short", "TXT", name], DIG_TIMEOUT)
            .await?;
        if !out.status.success() {
            return Err(GatewayError::tool_failed("dig", &out).into());
        }
        Ok(parse_dig_short(&String::from_utf8_lossy(&out.stdout)))
    }
}

/// One value per line. Long TXT values come back as several quoted
/// strings on one line and are joined.
fn parse_dig_short(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with(';'))
        .map(|l| {
            l.split("\" \"")
                .collect::<String>()
                .trim_matches('"')
                .to_string()
        })
        .collect()
}
