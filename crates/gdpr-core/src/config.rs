//! Export configuration file and its discovery.
//!
//! Resolution order for the file: CLI argument → environment variables →
//! XDG config directory → /etc → built-in defaults.

use crate::logging::LogSection;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Direct path to a config file.
pub const ENV_CONFIG_PATH: &str = "GDPR_EXPORT_CONFIG";
/// Directory containing `export.toml`.
pub const ENV_CONFIG_DIR: &str = "GDPR_EXPORT_CONFIG_DIR";
/// Overrides `staging_dir` from the file.
pub const ENV_STAGING_DIR: &str = "GDPR_EXPORT_STAGING_DIR";

pub const CONFIG_FILENAME: &str = "export.toml";
const APP_NAME: &str = "gdpr-export";

/// Base DN used in LDIF profiles when none is configured.
pub const DEFAULT_BASE_DN: &str = "ou=users,dc=georchestra,dc=org";

/// Contents of `export.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Root under which per-export staging directories and archives are
    /// created. Defaults to the system temp directory.
    pub staging_dir: Option<PathBuf>,
    /// Directory suffix for the `dn:` line of exported profiles.
    pub base_dn: Option<String>,
    pub log: LogSection,
}

impl ExportConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&text).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn staging_root(&self) -> PathBuf {
        self.staging_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn base_dn(&self) -> &str {
        self.base_dn.as_deref().unwrap_or(DEFAULT_BASE_DN)
    }
}

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    CliArgument,
    Environment,
    XdgConfig,
    SystemConfig,
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Candidate locations for the config file, in lookup order.
#[derive(Debug, Clone, Default)]
pub struct SearchPaths {
    pub cli: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    pub env_dir: Option<PathBuf>,
    pub xdg_dir: Option<PathBuf>,
    pub system_dir: Option<PathBuf>,
}

impl SearchPaths {
    /// Candidates taken from the process environment.
    pub fn from_env(cli: Option<&Path>) -> Self {
        Self {
            cli: cli.map(Path::to_path_buf),
            env_file: std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from),
            env_dir: std::env::var_os(ENV_CONFIG_DIR).map(PathBuf::from),
            xdg_dir: dirs::config_dir().map(|d| d.join(APP_NAME)),
            system_dir: Some(PathBuf::from("/etc").join(APP_NAME)),
        }
    }

    /// Find the first existing config file.
    ///
    /// An explicit CLI path must exist; the other candidates are skipped
    /// when absent.
    pub fn locate(&self) -> Result<(Option<PathBuf>, ConfigSource)> {
        if let Some(path) = &self.cli {
            if !path.is_file() {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Ok((Some(path.clone()), ConfigSource::CliArgument));
        }

        let candidates = [
            (self.env_file.clone(), ConfigSource::Environment),
            (
                self.env_dir.as_ref().map(|d| d.join(CONFIG_FILENAME)),
                ConfigSource::Environment,
            ),
            (
                self.xdg_dir.as_ref().map(|d| d.join(CONFIG_FILENAME)),
                ConfigSource::XdgConfig,
            ),
            (
                self.system_dir.as_ref().map(|d| d.join(CONFIG_FILENAME)),
                ConfigSource::SystemConfig,
            ),
        ];

        for (path, source) in candidates {
            if let Some(path) = path {
                if path.is_file() {
                    return Ok((Some(path), source));
                }
                debug!(path = %path.display(), %source, "No config file here");
            }
        }

        Ok((None, ConfigSource::BuiltinDefault))
    }
}

/// The effective configuration plus where it came from.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub config: ExportConfig,
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
    pub staging_source: ConfigSource,
}

impl ResolvedConfig {
    pub fn staging_root(&self) -> PathBuf {
        self.config.staging_root()
    }
}

/// Load configuration from the process environment and CLI overrides.
pub fn resolve_config(
    cli_config: Option<&Path>,
    cli_staging_dir: Option<&Path>,
) -> Result<ResolvedConfig> {
    let env_staging = std::env::var_os(ENV_STAGING_DIR).map(PathBuf::from);
    resolve_with(
        &SearchPaths::from_env(cli_config),
        env_staging,
        cli_staging_dir.map(Path::to_path_buf),
    )
}

/// Load configuration from explicit search paths and staging overrides.
pub fn resolve_with(
    paths: &SearchPaths,
    env_staging: Option<PathBuf>,
    cli_staging: Option<PathBuf>,
) -> Result<ResolvedConfig> {
    let (path, source) = paths.locate()?;
    let mut config = match &path {
        Some(path) => ExportConfig::load(path)?,
        None => ExportConfig::default(),
    };

    let mut staging_source = if config.staging_dir.is_some() {
        source
    } else {
        ConfigSource::BuiltinDefault
    };
    if let Some(dir) = env_staging {
        config.staging_dir = Some(dir);
        staging_source = ConfigSource::Environment;
    }
    if let Some(dir) = cli_staging {
        config.staging_dir = Some(dir);
        staging_source = ConfigSource::CliArgument;
    }

    debug!(
        path = ?path,
        %source,
        staging = %config.staging_root().display(),
        %staging_source,
        "Configuration resolved"
    );

    Ok(ResolvedConfig {
        config,
        path,
        source,
        staging_source,
    })
}
