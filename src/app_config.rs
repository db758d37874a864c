//! Application configuration: TOML file defaults merged with CLI flags.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use favicon_core::DEFAULT_PROBE_TIMEOUT;
use favicon_core::batch::{DEFAULT_CONCURRENCY, MAX_CONCURRENCY, MIN_CONCURRENCY};
use favicon_core::download::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use favicon_core::download::{DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};

use crate::cli::Args;

/// Output directory used when neither the CLI nor the config names one.
pub const DEFAULT_OUTPUT_DIR: &str = "favicon_ico";

const CONFIG_DIR_NAME: &str = "favicons";
const CONFIG_FILE_NAME: &str = "config.toml";
const MAX_TIMEOUT_SECS: u64 = 3600;

/// TOML-backed file configuration for CLI defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Default output directory.
    pub output_dir: Option<PathBuf>,
    /// Default concurrency (same range as CLI).
    pub concurrency: Option<usize>,
    /// Per-request probe timeout in seconds.
    pub probe_timeout_secs: Option<u64>,
    /// Download client connect timeout in seconds.
    pub download_connect_timeout_secs: Option<u64>,
    /// Download client read timeout in seconds.
    pub download_read_timeout_secs: Option<u64>,
    /// Bytes per write when saving a favicon.
    pub chunk_size: Option<usize>,
    /// Keep partial files after a failed download.
    pub keep_partial: Option<bool>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(concurrency) = self.concurrency
            && !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency)
        {
            bail!(
                "Invalid config value for `concurrency`: {concurrency}. Expected range: {MIN_CONCURRENCY}..={MAX_CONCURRENCY}"
            );
        }
        if let Some(chunk_size) = self.chunk_size
            && !(1..=MAX_CHUNK_SIZE).contains(&chunk_size)
        {
            bail!(
                "Invalid config value for `chunk_size`: {chunk_size}. Expected range: 1..={MAX_CHUNK_SIZE}"
            );
        }
        validate_timeout_secs("probe_timeout_secs", self.probe_timeout_secs)?;
        validate_timeout_secs(
            "download_connect_timeout_secs",
            self.download_connect_timeout_secs,
        )?;
        validate_timeout_secs(
            "download_read_timeout_secs",
            self.download_read_timeout_secs,
        )?;
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=MAX_TIMEOUT_SECS).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..={MAX_TIMEOUT_SECS}");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Returns the tracing level this setting maps to.
    #[must_use]
    pub fn level(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose | Self::Debug => "debug",
            Self::Quiet => "error",
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Config path that was consulted, if any.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/favicons/config.toml`
/// 2. `$HOME/.config/favicons/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config named on the command line, or the default one if present.
///
/// An explicit path must exist; a missing default file is not an error.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(config),
        });
    }

    let path = resolve_default_config_path();
    match path.as_deref() {
        Some(path_ref) if path_ref.exists() => {
            let config = load_file_config(path_ref)?;
            Ok(LoadedConfig {
                path,
                config: Some(config),
            })
        }
        _ => Ok(LoadedConfig { path, config: None }),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let cfg: FileConfig = toml::from_str(raw).context("Invalid config syntax")?;
    cfg.validate()?;
    Ok(cfg)
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub output_dir: PathBuf,
    pub concurrency: usize,
    pub probe_timeout: Duration,
    pub download_connect_timeout: Duration,
    pub download_read_timeout: Duration,
    pub chunk_size: usize,
    pub keep_partial: bool,
}

impl RunSettings {
    /// Merges CLI flags over file values over built-in defaults.
    #[must_use]
    pub fn resolve(args: &Args, file: Option<&FileConfig>) -> Self {
        let file = file.cloned().unwrap_or_default();
        Self {
            output_dir: args
                .output_dir
                .clone()
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            concurrency: args
                .concurrency
                .map(usize::from)
                .or(file.concurrency)
                .unwrap_or(DEFAULT_CONCURRENCY),
            probe_timeout: args
                .timeout
                .or(file.probe_timeout_secs)
                .map_or(DEFAULT_PROBE_TIMEOUT, Duration::from_secs),
            download_connect_timeout: Duration::from_secs(
                file.download_connect_timeout_secs
                    .unwrap_or(CONNECT_TIMEOUT_SECS),
            ),
            download_read_timeout: Duration::from_secs(
                file.download_read_timeout_secs.unwrap_or(READ_TIMEOUT_SECS),
            ),
            chunk_size: args
                .chunk_size
                .or(file.chunk_size)
                .unwrap_or(DEFAULT_CHUNK_SIZE),
            keep_partial: args.keep_partial || file.keep_partial.unwrap_or(false),
        }
    }
}

/// Picks the default log level.
///
/// Priority: quiet flag > verbose flag > config verbosity > `info`.
/// `RUST_LOG` still overrides whatever this returns.
#[must_use]
pub fn default_log_level(args: &Args, file: Option<&FileConfig>) -> &'static str {
    if args.quiet {
        return "error";
    }
    match args.verbose {
        0 => file
            .and_then(|cfg| cfg.verbosity)
            .map_or("info", VerbositySetting::level),
        1 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::Parser;
    use tempfile::TempDir;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["favicons"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = parse_config_str(
            r#"
concurrency = 8
verbosity = "verbose"
"#,
        )
        .expect("partial config should parse");
        assert_eq!(cfg.concurrency, Some(8));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Verbose));
        assert!(cfg.output_dir.is_none());
    }

    #[test]
    fn test_parse_config_all_fields() {
        let cfg = parse_config_str(
            r#"
output_dir = "icons"
concurrency = 4
probe_timeout_secs = 10
download_connect_timeout_secs = 15
download_read_timeout_secs = 120
chunk_size = 2048
keep_partial = true
verbosity = "quiet" # preferred noise level
"#,
        )
        .expect("full config should parse");
        assert_eq!(cfg.output_dir, Some(PathBuf::from("icons")));
        assert_eq!(cfg.probe_timeout_secs, Some(10));
        assert_eq!(cfg.download_connect_timeout_secs, Some(15));
        assert_eq!(cfg.download_read_timeout_secs, Some(120));
        assert_eq!(cfg.chunk_size, Some(2048));
        assert_eq!(cfg.keep_partial, Some(true));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Quiet));
    }

    #[test]
    fn test_parse_config_rejects_invalid_concurrency() {
        let err = parse_config_str("concurrency = 0").expect_err("invalid concurrency expected");
        assert!(format!("{err:#}").contains("concurrency"));
    }

    #[test]
    fn test_parse_config_rejects_invalid_timeout_value() {
        let err = parse_config_str("probe_timeout_secs = 0").expect_err("invalid timeout expected");
        assert!(format!("{err:#}").contains("probe_timeout_secs"));
    }

    #[test]
    fn test_parse_config_rejects_oversized_chunk() {
        let err = parse_config_str("chunk_size = 2097152").expect_err("chunk too large");
        assert!(format!("{err:#}").contains("chunk_size"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        let err = parse_config_str("unknown_key = 123").expect_err("unknown key error expected");
        assert!(format!("{err:#}").contains("unknown_key"));
    }

    #[test]
    fn test_parse_config_rejects_wrong_types() {
        let err = parse_config_str("keep_partial = \"yes\"").expect_err("type error expected");
        assert!(format!("{err:#}").contains("keep_partial"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_verbosity() {
        assert!(parse_config_str("verbosity = \"loud\"").is_err());
    }

    #[test]
    fn test_load_config_explicit_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = load_config(Some(&missing)).expect_err("missing explicit config");
        assert!(format!("{err:#}").contains("nope.toml"));
    }

    #[test]
    fn test_load_config_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "concurrency = 3\n").unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.config.unwrap().concurrency, Some(3));
    }

    #[test]
    fn test_run_settings_defaults() {
        let settings = RunSettings::resolve(&args(&[]), None);
        assert_eq!(settings.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(settings.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(settings.probe_timeout, DEFAULT_PROBE_TIMEOUT);
        assert_eq!(settings.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(!settings.keep_partial);
    }

    #[test]
    fn test_run_settings_cli_overrides_file() {
        let file = FileConfig {
            output_dir: Some(PathBuf::from("from-file")),
            concurrency: Some(8),
            probe_timeout_secs: Some(20),
            chunk_size: Some(512),
            keep_partial: Some(true),
            ..FileConfig::default()
        };

        let settings = RunSettings::resolve(&args(&["-o", "from-cli", "-c", "2"]), Some(&file));
        assert_eq!(settings.output_dir, PathBuf::from("from-cli"));
        assert_eq!(settings.concurrency, 2);
        assert_eq!(settings.probe_timeout, Duration::from_secs(20));
        assert_eq!(settings.chunk_size, 512);
        assert!(settings.keep_partial);
    }

    #[test]
    fn test_default_log_level_priority() {
        let file = FileConfig {
            verbosity: Some(VerbositySetting::Debug),
            ..FileConfig::default()
        };
        assert_eq!(default_log_level(&args(&[]), None), "info");
        assert_eq!(default_log_level(&args(&[]), Some(&file)), "debug");
        assert_eq!(default_log_level(&args(&["-vv"]), Some(&file)), "trace");
        assert_eq!(default_log_level(&args(&["-q", "-v"]), Some(&file)), "error");
    }
}
