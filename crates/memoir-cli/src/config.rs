//! Configuration Vault – reads/writes `~/.memoir/config.toml`.
//!
//! ```toml
//! catalog_path = "/home/me/memories.toml"   # optional, built-in set otherwise
//!
//! [flyover]
//! dwell_secs = 8
//! start_delay_secs = 2
//! zoom = 14.0
//! pitch = 60.0
//! speed = 0.6
//! curve = 1.4
//!
//! [style]
//! style_url = "mapbox://styles/mapbox/light-v11"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use memoir_map::MapStyle;
use memoir_runtime::FlyoverConfig;
use memoir_types::FlyoverError;
use serde::{Deserialize, Serialize};

/// Persisted user configuration.  Every field falls back to its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Memory catalog document.  The built-in memories are used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,

    /// Camera profile and dwell interval.
    pub flyover: FlyoverConfig,

    /// Base map, terrain and building layers, applied once at startup.
    pub style: MapStyle,
}

/// Return the path to `~/.memoir/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".memoir").join("config.toml")
}

/// Load the config from `path`.  Returns `None` if the file does not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, FlyoverError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        FlyoverError::Config(format!("failed to read config at {}: {e}", path.display()))
    })?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| FlyoverError::Config(format!("failed to parse config: {e}")))?;
    apply_env_overrides(&mut cfg);
    cfg.flyover.validate()?;
    Ok(Some(cfg))
}

/// Load the config, writing the defaults on first run.
///
/// Returns the config and whether it was freshly created.
pub fn load_or_init() -> Result<(Config, bool), FlyoverError> {
    load_or_init_at(&config_path())
}

pub(crate) fn load_or_init_at(path: &Path) -> Result<(Config, bool), FlyoverError> {
    if let Some(cfg) = load_from(path)? {
        return Ok((cfg, false));
    }
    save_to(&Config::default(), path)?;
    let mut cfg = Config::default();
    apply_env_overrides(&mut cfg);
    cfg.flyover.validate()?;
    Ok((cfg, true))
}

/// Apply `MEMOIR_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `MEMOIR_DWELL_SECS` | `flyover.dwell_secs` |
/// | `MEMOIR_ZOOM` | `flyover.zoom` |
/// | `MEMOIR_CATALOG` | `catalog_path` |
///
/// Unparsable numbers are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("MEMOIR_DWELL_SECS")
        && let Ok(secs) = v.parse::<u64>()
    {
        cfg.flyover.dwell_secs = secs;
    }
    if let Ok(v) = std::env::var("MEMOIR_ZOOM")
        && let Ok(zoom) = v.parse::<f64>()
    {
        cfg.flyover.zoom = zoom;
    }
    if let Ok(v) = std::env::var("MEMOIR_CATALOG")
        && !v.is_empty()
    {
        cfg.catalog_path = Some(PathBuf::from(v));
    }
}

/// Save the config, creating its directory if necessary.
pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), FlyoverError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| FlyoverError::Config(format!("failed to create config directory: {e}")))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700)).map_err(|e| {
                FlyoverError::Config(format!("failed to set config directory permissions: {e}"))
            })?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| FlyoverError::Config(format!("failed to serialize config: {e}")))?;
    write_private(path, &raw).map_err(|e| {
        FlyoverError::Config(format!("failed to write config at {}: {e}", path.display()))
    })
}

#[cfg(unix)]
fn write_private(path: &Path, raw: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(raw.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &Path, raw: &str) -> std::io::Result<()> {
    fs::write(path, raw)
}
