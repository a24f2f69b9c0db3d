//! Arweave JWK wallet files.
//!
//! Only the public modulus is read; the address is the base64url SHA-256 of
//! its raw bytes.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

use crate::domain::error::WalletError;

/// A parsed wallet: its derived address and the original document.
#[derive(Debug, Clone, PartialEq)]
pub struct Wallet {
    pub address: String,
    pub jwk: serde_json::Value,
}

impl Wallet {
    /// Parse a JWK document and derive its address.
    ///
    /// # Errors
    ///
    /// Returns a `WalletError` if the JSON is invalid or has no usable `n`.
    pub fn from_jwk(text: &str) -> Result<Self, WalletError> {
        let jwk: serde_json::Value =
            serde_json::from_str(text).map_err(|e| WalletError::InvalidJson(e.to_string()))?;
        let modulus = jwk
            .get("n")
            .and_then(serde_json::Value::as_str)
            .ok_or(WalletError::MissingModulus)?;
        let raw = URL_SAFE_NO_PAD
            .decode(modulus.trim_end_matches('='))
            .map_err(|_| WalletError::InvalidModulus)?;
        let address = URL_SAFE_NO_PAD.encode(Sha256::digest(&raw));
        Ok(Self { address, jwk })
    }

    /// File name under `wallets/`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.json", self.address)
    }
}
