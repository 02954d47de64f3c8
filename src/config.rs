//! Layered configuration for the stop monitor.
//!
//! Settings are resolved once at startup, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. a TOML file (`stopmon.toml` in the working directory if present, or
//!    the path given with `--config`, which must then exist)
//! 3. `STOPMON_*` environment variables (`STOPMON_API_KEY`, `STOPMON_STOP_CODE`, ...)
//! 4. command-line flags
//!
//! ```toml
//! api_key = "..."
//! stop_code = "16633"
//! agency = "SF"
//! poll_interval = "62s"
//! request_timeout = "15s"
//! csv_path = "stop_16633_arrivals.csv"
//! archive_path = "stop_16633_raw.jsonl"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use stopmon_adapters::siri::{DEFAULT_AGENCY, DEFAULT_ENDPOINT};

use crate::duration::parse_duration;

/// Config file picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "stopmon.toml";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "STOPMON";

/// Values given on the command line. `None` leaves lower layers in charge.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub stop_code: Option<String>,
    pub agency: Option<String>,
    pub endpoint: Option<String>,
    pub poll_interval: Option<String>,
    pub request_timeout: Option<String>,
    pub csv_path: Option<PathBuf>,
    pub archive_path: Option<PathBuf>,
    pub resume_numbering: Option<bool>,
}

/// Shape of the merged configuration before validation.
#[derive(Debug, Deserialize)]
struct RawSettings {
    api_key: Option<String>,
    stop_code: Option<String>,
    agency: String,
    endpoint: String,
    poll_interval: String,
    request_timeout: String,
    csv_path: Option<PathBuf>,
    archive_path: Option<PathBuf>,
    resume_numbering: bool,
    log_level: String,
}

/// Validated settings, fixed for the lifetime of the process.
#[derive(Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub stop_code: Option<String>,
    pub agency: String,
    pub endpoint: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub csv_path: PathBuf,
    pub archive_path: PathBuf,
    pub resume_numbering: bool,
    pub log_level: String,
}

impl Settings {
    /// Load settings from all layers, reading the real process environment.
    pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        Self::load_with_env(
            config_file,
            overrides,
            Environment::with_prefix(ENV_PREFIX),
        )
    }

    /// Load settings with an explicit environment source.
    pub fn load_with_env(
        config_file: Option<&Path>,
        overrides: &Overrides,
        env: Environment,
    ) -> Result<Self> {
        let file = match config_file {
            Some(path) => File::from(path),
            None => File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
        };

        let builder = with_defaults(Config::builder())?
            .add_source(file)
            .add_source(env);
        let config = with_overrides(builder, overrides)?
            .build()
            .context("failed to read configuration")?;

        let raw: RawSettings = config
            .try_deserialize()
            .context("invalid configuration")?;
        Self::validate(raw)
    }

    /// The API key and stop code, which live polling cannot do without.
    pub fn live_target(&self) -> Result<(&str, &str)> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("no API key configured (set {}_API_KEY or api_key)", ENV_PREFIX))?;
        let stop_code = self
            .stop_code
            .as_deref()
            .ok_or_else(|| anyhow!("no stop configured (use --stop, {}_STOP_CODE or stop_code)", ENV_PREFIX))?;
        Ok((api_key, stop_code))
    }

    fn validate(raw: RawSettings) -> Result<Self> {
        let poll_interval = parse_duration(&raw.poll_interval)
            .with_context(|| format!("invalid poll_interval '{}'", raw.poll_interval))?;
        let request_timeout = parse_duration(&raw.request_timeout)
            .with_context(|| format!("invalid request_timeout '{}'", raw.request_timeout))?;
        if poll_interval.is_zero() {
            return Err(anyhow!("poll_interval must be greater than zero"));
        }
        if request_timeout.is_zero() {
            return Err(anyhow!("request_timeout must be greater than zero"));
        }

        let api_key = non_blank(raw.api_key);
        let stop_code = non_blank(raw.stop_code);
        let stem = match &stop_code {
            Some(code) => format!("stop_{}", code),
            None => "stop".to_string(),
        };

        Ok(Self {
            csv_path: raw
                .csv_path
                .unwrap_or_else(|| PathBuf::from(format!("{}_arrivals.csv", stem))),
            archive_path: raw
                .archive_path
                .unwrap_or_else(|| PathBuf::from(format!("{}_raw.jsonl", stem))),
            api_key,
            stop_code,
            agency: raw.agency,
            endpoint: raw.endpoint,
            poll_interval,
            request_timeout,
            resume_numbering: raw.resume_numbering,
            log_level: raw.log_level,
        })
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("stop_code", &self.stop_code)
            .field("agency", &self.agency)
            .field("endpoint", &self.endpoint)
            .field("poll_interval", &self.poll_interval)
            .field("request_timeout", &self.request_timeout)
            .field("csv_path", &self.csv_path)
            .field("archive_path", &self.archive_path)
            .field("resume_numbering", &self.resume_numbering)
            .field("log_level", &self.log_level)
            .finish()
    }
}

fn with_defaults(builder: ConfigBuilder<DefaultState>) -> Result<ConfigBuilder<DefaultState>> {
    Ok(builder
        .set_default("agency", DEFAULT_AGENCY)?
        .set_default("endpoint", DEFAULT_ENDPOINT)?
        .set_default("poll_interval", "62s")?
        .set_default("request_timeout", "15s")?
        .set_default("resume_numbering", false)?
        .set_default("log_level", "info")?)
}

fn with_overrides(
    builder: ConfigBuilder<DefaultState>,
    overrides: &Overrides,
) -> Result<ConfigBuilder<DefaultState>> {
    let path_string = |p: &Option<PathBuf>| p.as_ref().map(|p| p.to_string_lossy().into_owned());

    Ok(builder
        .set_override_option("stop_code", overrides.stop_code.clone())?
        .set_override_option("agency", overrides.agency.clone())?
        .set_override_option("endpoint", overrides.endpoint.clone())?
        .set_override_option("poll_interval", overrides.poll_interval.clone())?
        .set_override_option("request_timeout", overrides.request_timeout.clone())?
        .set_override_option("csv_path", path_string(&overrides.csv_path))?
        .set_override_option("archive_path", path_string(&overrides.archive_path))?
        .set_override_option("resume_numbering", overrides.resume_numbering)?)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
