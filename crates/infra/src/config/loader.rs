//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Environment variables, when `LEVELSET_SERVER_URL` is set
//! 2. Otherwise the first config file found by [`probe_config_paths`]
//! 3. Otherwise built-in defaults
//!
//! The result is validated before it is returned.
//!
//! ## Environment Variables
//! - `LEVELSET_SERVER_URL`: API server base URL (required for env loading)
//! - `LEVELSET_TOKEN`: bearer token
//! - `LEVELSET_TOKEN_FILE`: file holding the bearer token
//! - `LEVELSET_REQUEST_TIMEOUT_SECS`: per-request timeout
//! - `LEVELSET_NAMESPACE`: namespace to watch, empty for all
//! - `LEVELSET_RESYNC_SECS`: relist interval
//! - `LEVELSET_WORKERS`: reconcile workers
//! - `LEVELSET_RETRY_LIMIT`: failures tolerated per key
//! - `LEVELSET_FORGET_ON_SUCCESS`: reset a key's failures after success
//! - `LEVELSET_LOG_LEVEL`: default log filter
//! - `LEVELSET_LOG_FORMAT`: `pretty` or `json`
//!
//! ## File Locations
//! `levelset.toml`, `levelset.json`, `config.toml` and `config.json` are
//! probed in the working directory, its parent and grandparent, then next
//! to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use levelset_domain::constants::ENV_PREFIX;
use levelset_domain::{Config, LevelsetError, LogFormat, Result};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["levelset.toml", "levelset.json", "config.toml", "config.json"];
const SEARCH_DIRS: [&str; 3] = [".", "..", "../.."];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `LevelsetError::Config` if a source is present but malformed,
/// or if the resulting configuration fails validation.
pub fn load() -> Result<Config> {
    let config = if std::env::var_os(env_key("SERVER_URL")).is_some() {
        tracing::info!("Configuration loaded from environment variables");
        load_from_env()?
    } else if let Some(path) = probe_config_paths() {
        load_from_file(Some(path))?
    } else {
        tracing::info!("No configuration found, using defaults");
        Config::default()
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// `LEVELSET_SERVER_URL` is required; every other variable is optional and
/// falls back to its default.
///
/// # Errors
/// Returns `LevelsetError::Config` if the server URL is missing or a
/// variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.client.server_url = env_var("SERVER_URL")?;
    if let Some(token) = env_opt("TOKEN") {
        config.client.token = Some(token);
    }
    if let Some(path) = env_opt("TOKEN_FILE") {
        config.client.token_file = Some(PathBuf::from(path));
    }
    if let Some(secs) = env_parse("REQUEST_TIMEOUT_SECS")? {
        config.client.request_timeout_secs = secs;
    }

    // An empty namespace is meaningful (all namespaces), so not env_opt
    if let Ok(namespace) = std::env::var(env_key("NAMESPACE")) {
        config.informer.namespace = namespace;
    }
    if let Some(secs) = env_parse("RESYNC_SECS")? {
        config.informer.resync_interval_secs = secs;
    }

    if let Some(workers) = env_parse("WORKERS")? {
        config.controller.workers = workers;
    }
    if let Some(limit) = env_parse("RETRY_LIMIT")? {
        config.controller.retry_limit = limit;
    }
    config.controller.forget_on_success =
        env_bool("FORGET_ON_SUCCESS", config.controller.forget_on_success);

    if let Some(level) = env_opt("LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = env_opt("LOG_FORMAT") {
        config.logging.format = LogFormat::from_str(&format).map_err(LevelsetError::Config)?;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `LevelsetError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) if p.exists() => p,
        Some(p) => {
            return Err(LevelsetError::Config(format!(
                "Config file not found: {}",
                p.display()
            )))
        }
        None => probe_config_paths().ok_or_else(|| {
            LevelsetError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| LevelsetError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration, choosing the format by file extension
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    match path.extension().and_then(|e| e.to_str()).unwrap_or("toml") {
        "toml" => toml::from_str(contents)
            .map_err(|e| LevelsetError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| LevelsetError::Config(format!("Invalid JSON format: {e}"))),
        other => Err(LevelsetError::Config(format!("Unsupported config format: {other}"))),
    }
}

/// First existing config file in the standard locations
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.extend(SEARCH_DIRS.iter().map(|dir| cwd.join(dir)));
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.is_file())
}

fn env_key(name: &str) -> String {
    format!("{ENV_PREFIX}{name}")
}

fn env_var(name: &str) -> Result<String> {
    let key = env_key(name);
    std::env::var(&key)
        .map_err(|_| LevelsetError::Config(format!("Missing required environment variable: {key}")))
}

/// Set and non-empty
fn env_opt(name: &str) -> Option<String> {
    std::env::var(env_key(name)).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(name)
        .map(|value| {
            value.trim().parse::<T>().map_err(|e| {
                LevelsetError::Config(format!("Invalid value for {}: {e}", env_key(name)))
            })
        })
        .transpose()
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(name: &str, default: bool) -> bool {
    env_opt(name)
        .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
