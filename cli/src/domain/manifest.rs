//! Compose manifest records: digests, sync outcomes and network discovery.
//!
//! Pure functions only.

use std::path::PathBuf;

use sha2::{Digest, Sha256};

/// Result of comparing the published manifest against the local copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No local manifest existed; the download was promoted in place.
    Installed,
    /// Local and remote bytes are identical.
    Unchanged,
    /// The remote manifest differs. It is kept at `pending` until the
    /// operator accepts or rejects it.
    NeedsConfirmation { pending: PathBuf },
}

/// Hex-encode bytes as a lowercase string.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(char::from(HEX[(b >> 4) as usize]));
        out.push(char::from(HEX[(b & 0xf) as usize]));
    }
    out
}

/// SHA-256 of `bytes`, hex-encoded.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex_encode(&Sha256::digest(bytes))
}

/// Name of the first network declared under the top-level `networks:` key.
///
/// Returns `None` when the manifest is not valid YAML or declares no network.
#[must_use]
pub fn network_name(manifest: &str) -> Option<String> {
    let doc: serde_yaml::Value = serde_yaml::from_str(manifest).ok()?;
    let networks = doc.get("networks")?.as_mapping()?;
    let (key, value) = networks.iter().next()?;
    // An explicit `name:` overrides the key as the runtime-visible name.
    value
        .get("name")
        .and_then(serde_yaml::Value::as_str)
        .or_else(|| key.as_str())
        .map(str::to_string)
}
