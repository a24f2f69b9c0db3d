//! Registrar host records and the Namecheap XML wire format.
//!
//! `setHosts` replaces the full record set, so every mutation here is a pure
//! read-modify-write over the list returned by `getHosts`.

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::error::RegistrarError;

/// TTL for A records created by gatewayctl.
pub const A_RECORD_TTL: u32 = 1800;
/// TTL for ACME challenge TXT records.
pub const TXT_RECORD_TTL: u32 = 60;
/// Label under which DNS-01 validation tokens are published.
pub const ACME_CHALLENGE_LABEL: &str = "_acme-challenge";

static HOST_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"<host\s+([^>]*?)/?>").expect("valid regex")
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r#"(\w+)="([^"]*)""#).expect("valid regex")
});

static ERROR_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"<Error[^>]*>([^<]*)</Error>").expect("valid regex")
});

/// One DNS host record as the registrar stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    /// Host label relative to the registered domain (`@`, `*`, `www`).
    pub name: String,
    pub record_type: String,
    pub address: String,
    pub ttl: u32,
    /// Only meaningful for MX records.
    pub mx_pref: Option<u32>,
}

impl HostRecord {
    #[must_use]
    pub fn a(name: &str, address: Ipv4Addr) -> Self {
        Self {
            name: name.to_string(),
            record_type: "A".to_string(),
            address: address.to_string(),
            ttl: A_RECORD_TTL,
            mx_pref: None,
        }
    }

    #[must_use]
    pub fn txt(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            record_type: "TXT".to_string(),
            address: value.to_string(),
            ttl: TXT_RECORD_TTL,
            mx_pref: None,
        }
    }

    fn same_slot(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && self.record_type.eq_ignore_ascii_case(&other.record_type)
    }
}

/// A domain split into the two parts the registrar API addresses it by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredDomain {
    pub sld: String,
    pub tld: String,
}

impl RegisteredDomain {
    /// Split on the last two labels: `a.b.example.com` → (`example`, `com`).
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedDomain` for names with fewer than two labels.
    pub fn from_fqdn(fqdn: &str) -> Result<Self, RegistrarError> {
        let fqdn = fqdn.trim_end_matches('.');
        let mut labels = fqdn.rsplit('.');
        match (labels.next(), labels.next()) {
            (Some(tld), Some(sld)) if !tld.is_empty() && !sld.is_empty() => Ok(Self {
                sld: sld.to_ascii_lowercase(),
                tld: tld.to_ascii_lowercase(),
            }),
            _ => Err(RegistrarError::UnsupportedDomain(fqdn.to_string())),
        }
    }

    #[must_use]
    pub fn name(&self) -> String {
        format!("{}.{}", self.sld, self.tld)
    }

    /// Host label of `fqdn` relative to this domain (`@` for the apex).
    #[must_use]
    pub fn relative_host(&self, fqdn: &str) -> String {
        let fqdn = fqdn.trim_end_matches('.').to_ascii_lowercase();
        let apex = self.name();
        if fqdn == apex {
            return "@".to_string();
        }
        fqdn.strip_suffix(&format!(".{apex}"))
            .map_or(fqdn.clone(), str::to_string)
    }

    /// Host label of the DNS-01 challenge record for `fqdn`.
    #[must_use]
    pub fn challenge_host(&self, fqdn: &str) -> String {
        match self.relative_host(fqdn).as_str() {
            "@" => ACME_CHALLENGE_LABEL.to_string(),
            sub => format!("{ACME_CHALLENGE_LABEL}.{sub}"),
        }
    }
}

/// Replace the record occupying the same name and type, or append.
#[must_use]
pub fn upsert(mut records: Vec<HostRecord>, record: HostRecord) -> Vec<HostRecord> {
    match records.iter().position(|r| r.same_slot(&record)) {
        Some(pos) => {
            records.retain(|r| !r.same_slot(&record));
            records.insert(pos, record);
        }
        None => records.push(record),
    }
    records
}

/// Drop every record with the given name and type. Returns `None` when
/// nothing matched so callers can skip the write.
#[must_use]
pub fn remove(records: &[HostRecord], name: &str, record_type: &str) -> Option<Vec<HostRecord>> {
    let probe = HostRecord {
        name: name.to_string(),
        record_type: record_type.to_string(),
        address: String::new(),
        ttl: 0,
        mx_pref: None,
    };
    let kept: Vec<HostRecord> = records
        .iter()
        .filter(|r| !r.same_slot(&probe))
        .cloned()
        .collect();
    (kept.len() != records.len()).then_some(kept)
}

/// Form parameters describing the full record set for `setHosts`.
#[must_use]
pub fn set_hosts_params(records: &[HostRecord]) -> Vec<(String, String)> {
    let mut params = Vec::with_capacity(records.len() * 4 + 1);
    for (i, r) in records.iter().enumerate() {
        let n = i + 1;
        params.push((format!("HostName{n}"), r.name.clone()));
        params.push((format!("RecordType{n}"), r.record_type.clone()));
        params.push((format!("Address{n}"), r.address.clone()));
        params.push((format!("TTL{n}"), r.ttl.to_string()));
        if let Some(pref) = r.mx_pref {
            params.push((format!("MXPref{n}"), pref.to_string()));
        }
    }
    if records.iter().any(|r| r.record_type.eq_ignore_ascii_case("MX")) {
        params.push(("EmailType".to_string(), "MX".to_string()));
    }
    params
}

/// Parse a `namecheap.domains.dns.getHosts` response.
///
/// # Errors
///
/// Returns `Api` when the response carries `Status="ERROR"`.
pub fn parse_get_hosts(xml: &str) -> Result<Vec<HostRecord>, RegistrarError> {
    check_status(xml)?;
    if !xml.contains("DomainDNSGetHostsResult") {
        return Err(RegistrarError::Malformed(
            "missing DomainDNSGetHostsResult".to_string(),
        ));
    }
    HOST_TAG_RE
        .captures_iter(xml)
        .map(|tag| {
            let attrs = tag.get(1).map_or("", |m| m.as_str());
            let attr = |key: &str| {
                ATTR_RE
                    .captures_iter(attrs)
                    .find(|c| c.get(1).is_some_and(|k| k.as_str() == key))
                    .and_then(|c| c.get(2))
                    .map(|v| unescape(v.as_str()))
            };
            let name = attr("Name").ok_or_else(|| malformed("host without Name"))?;
            let record_type = attr("Type").ok_or_else(|| malformed("host without Type"))?;
            let address = attr("Address").unwrap_or_default();
            let ttl = attr("TTL")
                .and_then(|t| t.parse().ok())
                .unwrap_or(A_RECORD_TTL);
            let mx_pref = if record_type.eq_ignore_ascii_case("MX") {
                attr("MXPref").and_then(|p| p.parse().ok())
            } else {
                None
            };
            Ok(HostRecord {
                name,
                record_type,
                address,
                ttl,
                mx_pref,
            })
        })
        .collect()
}

/// Parse a `namecheap.domains.dns.setHosts` response.
///
/// # Errors
///
/// Returns `Api` on `Status="ERROR"` and `Malformed` when `IsSuccess` is not
/// `true`.
pub fn parse_set_hosts(xml: &str) -> Result<(), RegistrarError> {
    check_status(xml)?;
    if xml.contains(r#"IsSuccess="true""#) {
        Ok(())
    } else {
        Err(malformed("setHosts did not report IsSuccess=\"true\""))
    }
}

fn check_status(xml: &str) -> Result<(), RegistrarError> {
    if xml.contains(r#"Status="ERROR""#) {
        let messages: Vec<String> = ERROR_RE
            .captures_iter(xml)
            .filter_map(|c| c.get(1).map(|m| unescape(m.as_str().trim())))
            .collect();
        let detail = if messages.is_empty() {
            "unknown error".to_string()
        } else {
            messages.join("; ")
        };
        return Err(RegistrarError::Api(detail));
    }
    Ok(())
}

fn malformed(msg: &str) -> RegistrarError {
    RegistrarError::Malformed(msg.to_string())
}

fn unescape(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
