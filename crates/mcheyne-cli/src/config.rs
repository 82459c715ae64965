//! Configuration file management for mcheyne.
//!
//! Provides a TOML-based config file at `~/.config/mcheyne/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use mcheyne_core::source::HttpSource;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub server: ServerSection,
    pub data: DataSection,
    pub voice: VoiceSection,
    pub client: ClientSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// Path to the reading-plan JSON document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSection {
    /// Core API the voice channels forward to. Unset means in-process.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSection {
    /// Translation used for Bible Gateway links printed by the CLI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bible_version: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the mcheyne config directory: `$XDG_CONFIG_HOME/mcheyne` or
/// `~/.config/mcheyne`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("mcheyne");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("mcheyne")
}

/// Return the path to the mcheyne config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Where the CLI keeps its completion and preference state.
pub fn state_path() -> PathBuf {
    if let Ok(path) = std::env::var("MCHEYNE_STATE_PATH") {
        return PathBuf::from(path);
    }
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mcheyne")
        .join("state.json")
}

/// Container image location first, then the development checkout.
fn default_data_path() -> PathBuf {
    let docker = PathBuf::from(McheyneConfig::DOCKER_DATA_PATH);
    if docker.exists() {
        docker
    } else {
        PathBuf::from(McheyneConfig::DEV_DATA_PATH)
    }
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load the config file at `path`. A missing file yields `None`; a file that
/// exists but does not parse is an error.
pub fn load_config_from(path: &Path) -> Result<Option<ConfigFile>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read config file at {}", path.display()));
        }
    };
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(Some(config))
}

pub fn load_config() -> Result<Option<ConfigFile>> {
    load_config_from(&config_path())
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }
    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;
    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values supplied on the command line.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub data_path: Option<PathBuf>,
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub api_base_url: Option<String>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone)]
pub struct McheyneConfig {
    pub data_path: PathBuf,
    pub bind: String,
    pub port: u16,
    pub api_base_url: Option<String>,
    pub upstream_timeout: Duration,
    pub bible_version: String,
}

impl McheyneConfig {
    pub const DEFAULT_BIND: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 3000;
    pub const DOCKER_DATA_PATH: &str = "/app/data/reading_plan.json";
    pub const DEV_DATA_PATH: &str = "data/reading_plan.json";
    pub const DEFAULT_BIBLE_VERSION: &str = "CSB";

    /// Resolve configuration from the user's config file.
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let file = load_config()?;
        Self::resolve_with(cli, file.unwrap_or_default())
    }

    /// Resolve using the chain: CLI flag > env var > config file > default.
    ///
    /// - Data path: `--data` > `MCHEYNE_DATA_PATH` > `data.path` > docker/dev default
    /// - Bind: `--bind` > `MCHEYNE_BIND` > `server.bind` > `0.0.0.0`
    /// - Port: `--port` > `PORT` > `server.port` > `3000`
    /// - Upstream API: `--api-base-url` > `API_BASE_URL` > `voice.api_base_url` > none
    pub fn resolve_with(cli: &CliOverrides, file: ConfigFile) -> Result<Self> {
        let data_path = cli
            .data_path
            .clone()
            .or_else(|| std::env::var("MCHEYNE_DATA_PATH").ok().map(PathBuf::from))
            .or(file.data.path)
            .unwrap_or_else(default_data_path);

        let bind = cli
            .bind
            .clone()
            .or_else(|| std::env::var("MCHEYNE_BIND").ok())
            .or(file.server.bind)
            .unwrap_or_else(|| Self::DEFAULT_BIND.to_owned());

        let port = match (cli.port, std::env::var("PORT").ok()) {
            (Some(p), _) => p,
            (None, Some(raw)) => raw
                .parse()
                .with_context(|| format!("PORT env var is not a valid port: {raw:?}"))?,
            (None, None) => file.server.port.unwrap_or(Self::DEFAULT_PORT),
        };

        let api_base_url = cli
            .api_base_url
            .clone()
            .or_else(|| std::env::var("API_BASE_URL").ok())
            .or(file.voice.api_base_url)
            .filter(|u| !u.trim().is_empty());

        let upstream_timeout = file
            .voice
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(HttpSource::DEFAULT_TIMEOUT);

        let bible_version = file
            .client
            .bible_version
            .unwrap_or_else(|| Self::DEFAULT_BIBLE_VERSION.to_owned());

        Ok(Self {
            data_path,
            bind,
            port,
            api_base_url,
            upstream_timeout,
            bible_version,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    fn clear_env() {
        for var in ["MCHEYNE_DATA_PATH", "MCHEYNE_BIND", "PORT", "API_BASE_URL"] {
            unsafe { std::env::remove_var(var) };
        }
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("mcheyne").join("config.toml");

        let original = ConfigFile {
            server: ServerSection {
                bind: Some("127.0.0.1".into()),
                port: Some(8080),
            },
            data: DataSection {
                path: Some(PathBuf::from("/srv/reading_plan.json")),
            },
            voice: VoiceSection {
                api_base_url: Some("http://api:3000".into()),
                timeout_secs: Some(3),
            },
            client: ClientSection::default(),
        };
        save_config_to(&original, &path).unwrap();

        let loaded = load_config_from(&path).unwrap().expect("file should exist");
        assert_eq!(loaded.server.port, Some(8080));
        assert_eq!(loaded.data.path, original.data.path);
        assert_eq!(loaded.voice.api_base_url.as_deref(), Some("http://api:3000"));
        assert!(loaded.client.bible_version.is_none());
    }

    #[test]
    fn missing_config_is_none() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(load_config_from(&tmp.path().join("config.toml")).unwrap().is_none());
    }

    #[test]
    fn malformed_config_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config file"));
    }

    #[test]
    fn partial_config_file_fills_defaults() {
        let file: ConfigFile = toml::from_str("[server]\nport = 4000\n").unwrap();
        assert_eq!(file.server.port, Some(4000));
        assert!(file.server.bind.is_none());
        assert!(file.voice.api_base_url.is_none());
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = lock_env();
        clear_env();
        unsafe { std::env::set_var("PORT", "5000") };
        unsafe { std::env::set_var("MCHEYNE_DATA_PATH", "/env/plan.json") };

        let cli = CliOverrides {
            data_path: Some(PathBuf::from("/cli/plan.json")),
            port: Some(6000),
            ..Default::default()
        };
        let cfg = McheyneConfig::resolve_with(&cli, ConfigFile::default()).unwrap();
        assert_eq!(cfg.port, 6000);
        assert_eq!(cfg.data_path, PathBuf::from("/cli/plan.json"));

        clear_env();
    }

    #[test]
    fn resolve_with_env_var_overrides_config_file() {
        let _lock = lock_env();
        clear_env();
        unsafe { std::env::set_var("PORT", "5000") };
        unsafe { std::env::set_var("API_BASE_URL", "http://env:3000") };

        let file: ConfigFile =
            toml::from_str("[server]\nport = 4000\n[voice]\napi_base_url = \"http://file:3000\"\n")
                .unwrap();
        let cfg = McheyneConfig::resolve_with(&CliOverrides::default(), file).unwrap();
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.api_base_url.as_deref(), Some("http://env:3000"));

        clear_env();
    }

    #[test]
    fn resolve_defaults_when_nothing_set() {
        let _lock = lock_env();
        clear_env();

        let cfg = McheyneConfig::resolve_with(&CliOverrides::default(), ConfigFile::default())
            .unwrap();
        assert_eq!(cfg.port, McheyneConfig::DEFAULT_PORT);
        assert_eq!(cfg.bind, "0.0.0.0");
        assert!(cfg.api_base_url.is_none());
        assert_eq!(cfg.upstream_timeout, HttpSource::DEFAULT_TIMEOUT);
        assert_eq!(cfg.bible_version, "CSB");
    }

    #[test]
    fn resolve_rejects_non_numeric_port_env() {
        let _lock = lock_env();
        clear_env();
        unsafe { std::env::set_var("PORT", "http") };

        let result = McheyneConfig::resolve_with(&CliOverrides::default(), ConfigFile::default());

        clear_env();
        let msg = format!("{:#}", result.unwrap_err());
        assert!(msg.contains("PORT env var"), "unexpected error: {msg}");
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("mcheyne/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
