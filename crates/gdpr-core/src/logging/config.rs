//! Logging configuration.
//!
//! Level and format are layered, lowest precedence first:
//! - built-in defaults (info, human)
//! - the `[log]` section of the export config file
//! - environment variables (GDPR_LOG, RUST_LOG, GDPR_LOG_FORMAT)
//! - CLI flags (-v/-q, --log-format)

use serde::{Deserialize, Serialize};

/// Env var holding a bare level name.
pub const ENV_LOG_LEVEL: &str = "GDPR_LOG";
/// Env var holding the output format.
pub const ENV_LOG_FORMAT: &str = "GDPR_LOG_FORMAT";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console format (default).
    #[default]
    Human,
    /// One JSON object per line.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" | "pretty" | "text" => Ok(LogFormat::Human),
            "json" | "jsonl" => Ok(LogFormat::Json),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Human => write!(f, "human"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Log level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    /// Nothing is logged.
    Off,
}

impl LogLevel {
    /// Level implied by repeated `-v` / `-q` flags, if any were given.
    ///
    /// `-q` wins over `-v`.
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Option<LogLevel> {
        if quiet {
            return Some(LogLevel::Error);
        }
        match verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "off" | "none" => Ok(LogLevel::Off),
            _ => Err(format!("unknown log level: {}", s)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        };
        f.write_str(name)
    }
}

impl From<LogLevel> for tracing_subscriber::filter::LevelFilter {
    fn from(level: LogLevel) -> Self {
        use tracing_subscriber::filter::LevelFilter;
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Off => LevelFilter::OFF,
        }
    }
}

/// The `[log]` section of the export config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSection {
    pub level: Option<LogLevel>,
    pub format: Option<LogFormat>,
}

/// Effective logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Raw RUST_LOG directives. Only kept when neither GDPR_LOG nor a CLI
    /// flag chose the level.
    pub directives: Option<String>,
}

impl LogConfig {
    /// Build the effective config from the process environment.
    pub fn from_env(
        file: &LogSection,
        cli_level: Option<LogLevel>,
        cli_format: Option<LogFormat>,
    ) -> Self {
        Self::layered(file, |key| std::env::var(key).ok(), cli_level, cli_format)
    }

    /// Layer the file section, an environment lookup and CLI overrides.
    pub fn layered(
        file: &LogSection,
        env: impl Fn(&str) -> Option<String>,
        cli_level: Option<LogLevel>,
        cli_format: Option<LogFormat>,
    ) -> Self {
        let mut config = LogConfig::default();

        if let Some(level) = file.level {
            config.level = level;
        }
        if let Some(format) = file.format {
            config.format = format;
        }

        // GDPR_LOG takes precedence over RUST_LOG
        if let Some(level) = env(ENV_LOG_LEVEL).and_then(|v| v.parse().ok()) {
            config.level = level;
        } else if let Some(directives) = env("RUST_LOG").filter(|d| !d.trim().is_empty()) {
            if let Some(level) = coarse_level(&directives) {
                config.level = level;
            }
            config.directives = Some(directives);
        }
        if let Some(format) = env(ENV_LOG_FORMAT).and_then(|v| v.parse().ok()) {
            config.format = format;
        }

        if let Some(level) = cli_level {
            config.level = level;
            config.directives = None;
        }
        if let Some(format) = cli_format {
            config.format = format;
        }

        config
    }
}

/// Most verbose level named anywhere in a RUST_LOG directive string.
fn coarse_level(directives: &str) -> Option<LogLevel> {
    directives
        .split(',')
        .filter_map(|d| d.rsplit('=').next())
        .filter_map(|l| l.trim().parse::<LogLevel>().ok())
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_level_and_format() {
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("jsonl".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_layering_precedence() {
        let file = LogSection {
            level: Some(LogLevel::Warn),
            format: Some(LogFormat::Json),
        };

        let from_file = LogConfig::layered(&file, env_of(&[]), None, None);
        assert_eq!(from_file.level, LogLevel::Warn);
        assert_eq!(from_file.format, LogFormat::Json);

        let from_env = LogConfig::layered(
            &file,
            env_of(&[("GDPR_LOG", "debug"), ("GDPR_LOG_FORMAT", "human")]),
            None,
            None,
        );
        assert_eq!(from_env.level, LogLevel::Debug);
        assert_eq!(from_env.format, LogFormat::Human);

        let from_cli = LogConfig::layered(
            &file,
            env_of(&[("GDPR_LOG", "debug")]),
            Some(LogLevel::Error),
            None,
        );
        assert_eq!(from_cli.level, LogLevel::Error);
    }

    #[test]
    fn test_rust_log_directives() {
        let config = LogConfig::layered(
            &LogSection::default(),
            env_of(&[("RUST_LOG", "gdpr_core=debug,zip=warn")]),
            None,
            None,
        );
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(
            config.directives.as_deref(),
            Some("gdpr_core=debug,zip=warn")
        );
    }

    #[test]
    fn test_explicit_level_drops_rust_log_directives() {
        let rust_log = ("RUST_LOG", "gdpr_core=trace");

        let quiet = LogConfig::layered(
            &LogSection::default(),
            env_of(&[rust_log]),
            Some(LogLevel::Error),
            None,
        );
        assert_eq!(quiet.level, LogLevel::Error);
        assert_eq!(quiet.directives, None);

        let from_env = LogConfig::layered(
            &LogSection::default(),
            env_of(&[rust_log, ("GDPR_LOG", "warn")]),
            None,
            None,
        );
        assert_eq!(from_env.level, LogLevel::Warn);
        assert_eq!(from_env.directives, None);
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(LogLevel::from_verbosity(0, false), None);
        assert_eq!(LogLevel::from_verbosity(1, false), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_verbosity(3, false), Some(LogLevel::Trace));
        assert_eq!(LogLevel::from_verbosity(2, true), Some(LogLevel::Error));
    }
}
