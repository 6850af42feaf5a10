//! Configuration loading: config file, environment and CLI overrides.
//!
//! Lookup order for the config file:
//! 1. `--config <path>` (must exist)
//! 2. `./mml-sync.toml`
//! 3. `$XDG_CONFIG_HOME/mml-sync/config.toml`
//! 4. `$HOME/.config/mml-sync/config.toml`
//!
//! `MML_API_KEY` overrides the file's `api_key`; `--workers` overrides
//! `num_workers`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::debug;

use mml_sync_core::PoolConfig;
use mml_sync_core::download::constants::{MAX_WORKERS, REQUEST_TIMEOUT_SECS};
use mml_sync_core::feed::DEFAULT_ATOM_URL;

/// Environment variable holding the NLS API key.
pub(crate) const API_KEY_ENV: &str = "MML_API_KEY";

/// Config file looked up in the working directory.
pub(crate) const LOCAL_CONFIG_FILE: &str = "mml-sync.toml";

/// TOML-backed file configuration. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    /// NLS open data API key.
    pub(crate) api_key: Option<String>,
    /// Base URL of the Atom feed service.
    pub(crate) atom_url: Option<String>,
    /// Number of download workers.
    pub(crate) num_workers: Option<usize>,
    /// Per-request timeout for feed pages and downloads.
    pub(crate) request_timeout_secs: Option<u64>,
    /// Job queue capacity.
    pub(crate) queue_capacity: Option<usize>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(workers) = self.num_workers
            && !(1..=MAX_WORKERS).contains(&workers)
        {
            bail!(
                "Invalid config value for `num_workers`: {workers}. Expected range: 1..={MAX_WORKERS}"
            );
        }

        if let Some(timeout) = self.request_timeout_secs
            && !(1..=3600).contains(&timeout)
        {
            bail!(
                "Invalid config value for `request_timeout_secs`: {timeout}. Expected range: 1..=3600"
            );
        }

        if self.queue_capacity == Some(0) {
            bail!("Invalid config value for `queue_capacity`: 0. Expected at least 1");
        }

        if let Some(url) = self.atom_url.as_deref() {
            url::Url::parse(url)
                .with_context(|| format!("Invalid config value for `atom_url`: '{url}'"))?;
        }

        Ok(())
    }
}

/// Effective settings after merging file, environment and CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) api_key: Option<String>,
    pub(crate) atom_url: String,
    pub(crate) request_timeout: Duration,
    pub(crate) pool: PoolConfig,
}

impl Settings {
    /// Returns the API key or explains where to put one.
    pub(crate) fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) => Ok(key),
            None => bail!(
                "API key required: set {API_KEY_ENV} or `api_key` in {LOCAL_CONFIG_FILE}"
            ),
        }
    }
}

/// Loads the config file (if any) and merges environment and CLI overrides.
pub(crate) fn resolve_settings(explicit: Option<&Path>, cli_workers: Option<u16>) -> Result<Settings> {
    let file = match resolve_config_path(explicit)? {
        Some(path) => {
            debug!(path = %path.display(), "loading config file");
            load_file_config(&path)?
        }
        None => FileConfig::default(),
    };
    merge_settings(file, env_var_non_empty(API_KEY_ENV), cli_workers)
}

/// Combines the three configuration sources. Later sources win.
pub(crate) fn merge_settings(
    file: FileConfig,
    env_api_key: Option<String>,
    cli_workers: Option<u16>,
) -> Result<Settings> {
    let defaults = PoolConfig::default();
    let workers = cli_workers
        .map(usize::from)
        .or(file.num_workers)
        .unwrap_or(defaults.workers);
    if !(1..=MAX_WORKERS).contains(&workers) {
        bail!("Invalid worker count: {workers}. Expected range: 1..={MAX_WORKERS}");
    }

    let api_key = env_api_key.or(file.api_key.filter(|key| !key.trim().is_empty()));

    Ok(Settings {
        api_key,
        atom_url: file
            .atom_url
            .unwrap_or_else(|| DEFAULT_ATOM_URL.to_string()),
        request_timeout: Duration::from_secs(
            file.request_timeout_secs.unwrap_or(REQUEST_TIMEOUT_SECS),
        ),
        pool: PoolConfig {
            workers,
            queue_capacity: file.queue_capacity.unwrap_or(defaults.queue_capacity),
            max_retries: defaults.max_retries,
        },
    })
}

/// Resolves which config file to read, if any.
pub(crate) fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            bail!("Config file '{}' does not exist", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Ok(Some(local));
    }

    Ok(resolve_default_config_path().filter(|path| path.is_file()))
}

/// Resolves the per-user config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/mml-sync/config.toml`
/// 2. `$HOME/.config/mml-sync/config.toml`
#[must_use]
pub(crate) fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("mml-sync")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("mml-sync")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

fn env_var_non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Reads and validates one config file.
pub(crate) fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let config: FileConfig = toml::from_str(raw)?;
    config.validate()?;
    Ok(config)
}
