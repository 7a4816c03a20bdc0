use anyhow::{Context as AnyhowContext, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tally_core::{default_concurrency, parse_concurrency, TextEncoding};

pub const DEFAULT_CONFIG_FILE: &str = "tally.toml";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

const ENV_CONCURRENCY: &str = "TALLY_CONCURRENCY";
const ENV_ENCODING: &str = "TALLY_ENCODING";
const ENV_HTTP_TIMEOUT_SECS: &str = "TALLY_HTTP_TIMEOUT_SECS";

/// Contents of `tally.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub concurrency: Option<usize>,
    pub encoding: Option<String>,
    pub http_timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

impl FileConfig {
    pub fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Invalid tally config")
    }

    /// Load an explicit config path, or `tally.toml` in the working directory when present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    return Ok(Self::default());
                }
                fallback
            }
        };
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid {}", path.display()))
    }
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub concurrency: Option<usize>,
    pub encoding: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub concurrency: usize,
    pub encoding: TextEncoding,
    pub http_timeout: Duration,
    pub user_agent: String,
}

impl Settings {
    pub fn resolve(file: FileConfig, overrides: &Overrides) -> Result<Self> {
        Self::resolve_with_env(file, overrides, |key| std::env::var(key).ok())
    }

    /// Defaults, then the config file, then the environment, then flags.
    fn resolve_with_env(
        file: FileConfig,
        overrides: &Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let concurrency = if let Some(value) = overrides.concurrency {
            explicit_concurrency(value, "--concurrency")?
        } else if let Some(value) = env(ENV_CONCURRENCY).as_deref().and_then(parse_concurrency) {
            value
        } else if let Some(value) = file.concurrency {
            explicit_concurrency(value, "concurrency in config file")?
        } else {
            default_concurrency()
        };

        let encoding_label = overrides
            .encoding
            .clone()
            .or_else(|| env(ENV_ENCODING).filter(|v| !v.trim().is_empty()))
            .or(file.encoding);
        let encoding = match encoding_label {
            Some(label) => TextEncoding::for_label(&label)?,
            None => TextEncoding::default(),
        };

        let timeout_secs = overrides
            .timeout_secs
            .or_else(|| env(ENV_HTTP_TIMEOUT_SECS).and_then(|v| v.trim().parse().ok()))
            .or(file.http_timeout_secs)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        let user_agent = file
            .user_agent
            .unwrap_or_else(|| format!("tally/{}", env!("CARGO_PKG_VERSION")));

        Ok(Self {
            concurrency,
            encoding,
            http_timeout: Duration::from_secs(timeout_secs),
            user_agent,
        })
    }
}

fn explicit_concurrency(value: usize, what: &str) -> Result<usize> {
    if value == 0 {
        anyhow::bail!("{what} must be at least 1");
    }
    Ok(value)
}
