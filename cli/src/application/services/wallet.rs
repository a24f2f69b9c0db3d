//! Observer wallet import.

use std::path::Path;

use anyhow::{Context, Result};
use gateway_common::EnvVar;
use tracing::info;

use crate::application::ports::LocalFs;
use crate::application::services::artifacts::write_atomic;
use crate::application::services::env::merge_env;
use crate::domain::config::GatewayPaths;
use crate::domain::env_file::OBSERVER_WALLET_KEY;
use crate::domain::wallet::Wallet;

/// Copy a JWK wallet into `wallets/<address>.json` and point
/// `OBSERVER_WALLET` at it.
///
/// # Errors
///
/// Returns an error if the source cannot be read or parsed, or a write fails.
pub fn load_wallet(fs: &impl LocalFs, paths: &GatewayPaths, source: &Path) -> Result<Wallet> {
    let text = fs
        .read_to_string(source)
        .with_context(|| format!("reading wallet file {}", source.display()))?;
    let wallet = Wallet::from_jwk(&text)?;

    let dest = paths.wallets_dir().join(wallet.file_name());
    let pretty = serde_json::to_string_pretty(&wallet.jwk).context("serializing wallet")?;
    write_atomic(fs, &dest, &pretty).context("storing wallet")?;

    merge_env(
        fs,
        paths,
        &[EnvVar {
            key: OBSERVER_WALLET_KEY.to_string(),
            value: wallet.address.clone(),
        }],
    )?;
    info!(address = %wallet.address, "observer wallet loaded");
    Ok(wallet)
}
