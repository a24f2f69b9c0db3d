//! Environment file bootstrap and merge.

use anyhow::{Context, Result};
use gateway_common::EnvVar;
use tracing::info;

use crate::application::ports::LocalFs;
use crate::application::services::artifacts::write_atomic;
use crate::domain::config::GatewayPaths;
use crate::domain::env_file::EnvironmentConfig;
use crate::domain::error::EnvError;

/// Create the node directory and a default env file if either is missing.
/// Returns whether the env file was created.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created.
pub fn ensure_env_file(fs: &impl LocalFs, paths: &GatewayPaths) -> Result<bool> {
    fs.create_dir_all(paths.root())
        .with_context(|| format!("creating {}", paths.root().display()))?;
    let env_file = paths.env_file();
    if fs.exists(&env_file) {
        return Ok(false);
    }
    write_atomic(fs, &env_file, &EnvironmentConfig::defaults().to_string())
        .context("writing default environment file")?;
    info!(path = %env_file.display(), "environment file created");
    Ok(true)
}

/// Current env file contents. A missing file reads as empty.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn load_env(fs: &impl LocalFs, paths: &GatewayPaths) -> Result<EnvironmentConfig> {
    let env_file = paths.env_file();
    if !fs.exists(&env_file) {
        return Ok(EnvironmentConfig::default());
    }
    let text = fs
        .read_to_string(&env_file)
        .context("reading environment file")?;
    Ok(EnvironmentConfig::parse(&text))
}

/// Upsert `vars` into the env file. Untouched keys keep their order.
/// Returns whether anything changed; an unchanged file is not rewritten.
///
/// # Errors
///
/// Returns `EnvError` for an invalid name or a multi-line value, or an
/// error for a failed write. Nothing is written when any variable is bad.
pub fn merge_env(fs: &impl LocalFs, paths: &GatewayPaths, vars: &[EnvVar]) -> Result<bool> {
    for var in vars {
        if !EnvironmentConfig::is_valid_key(&var.key) {
            return Err(EnvError::InvalidKey(var.key.clone()).into());
        }
        if !EnvironmentConfig::is_valid_value(&var.value) {
            return Err(EnvError::MultilineValue(var.key.clone()).into());
        }
    }
    let mut env = load_env(fs, paths)?;
    let changed = env.upsert_all(vars.iter().map(|v| (v.key.as_str(), v.value.as_str())));
    if changed {
        write_atomic(fs, &paths.env_file(), &env.to_string())
            .context("writing environment file")?;
        info!(count = vars.len(), "environment file updated");
    }
    Ok(changed)
}
