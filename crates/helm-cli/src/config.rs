//! CLI configuration – reads/writes `~/.helm/config.toml`.

use helm_runtime::AutopilotConfig;
use helm_types::HelmError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted operator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Milliseconds between scheduling passes.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Snapshot to start from instead of the built-in demo ship.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_path: Option<PathBuf>,

    /// Stop after this many ticks.  Runs until Ctrl-C when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ticks: Option<u64>,

    /// Strategy thresholds.
    #[serde(default)]
    pub autopilot: AutopilotConfig,
}

fn default_tick_interval_ms() -> u64 {
    250
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            scenario_path: None,
            max_ticks: None,
            autopilot: AutopilotConfig::default(),
        }
    }
}

/// Return the path to `~/.helm/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".helm").join("config.toml")
}

/// Load the effective config: the file if present, defaults otherwise,
/// with `HELM_*` overrides applied on top.
pub fn load() -> Result<Config, HelmError> {
    let mut cfg = load_from(&config_path())?.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Parse the config at `path`.  Returns `None` if the file does not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, HelmError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        HelmError::Config(format!("failed to read {}: {e}", path.display()))
    })?;
    let cfg = toml::from_str(&raw)
        .map_err(|e| HelmError::Config(format!("failed to parse {}: {e}", path.display())))?;
    Ok(Some(cfg))
}

/// Apply `HELM_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `HELM_TICK_INTERVAL_MS` | `tick_interval_ms` (ignored unless a positive integer) |
/// | `HELM_SCENARIO` | `scenario_path` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("HELM_TICK_INTERVAL_MS")
        && let Ok(ms) = v.trim().parse::<u64>()
        && ms > 0
    {
        cfg.tick_interval_ms = ms;
    }
    if let Ok(v) = std::env::var("HELM_SCENARIO")
        && !v.is_empty()
    {
        cfg.scenario_path = Some(PathBuf::from(v));
    }
}

/// Save the config to disk, creating `~/.helm/` if necessary.
pub fn save(cfg: &Config) -> Result<(), HelmError> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), HelmError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| HelmError::Config(format!("failed to create config directory: {e}")))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700)).map_err(|e| {
                HelmError::Config(format!("failed to restrict config directory: {e}"))
            })?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| HelmError::Config(format!("failed to serialise config: {e}")))?;
    let write_err =
        |e: std::io::Error| HelmError::Config(format!("failed to write {}: {e}", path.display()));

    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .map_err(write_err)?;
        file.write_all(raw.as_bytes()).map_err(write_err)?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(write_err)?;
    Ok(())
}
