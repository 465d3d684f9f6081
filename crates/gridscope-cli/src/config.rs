// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub const APP_NAME: &str = "gridscope";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_TIMEOUT: &str = "5s";
const DEFAULT_SEED: u64 = 42;
const DEFAULT_COPIES: usize = 100;
const DEFAULT_DATA_LATENCY: &str = "500ms";
const DEFAULT_DETAIL_LATENCY: &str = "300ms";
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_ENV: &str = "GRIDSCOPE_LOG";
const CONFIG_PATH_ENV: &str = "GRIDSCOPE_CONFIG_PATH";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub demo: Demo,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            source: Source::default(),
            demo: Demo::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Demo,
    Http,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Source {
    pub kind: Option<SourceKind>,
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Demo {
    pub seed: Option<u64>,
    pub copies: Option<usize>,
    pub data_latency: Option<String>,
    pub detail_latency: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub columns: Option<Vec<String>>,
    pub initial_filter: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub path: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version; add `version = 1` and put values under [source], [demo], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(base_url) = &self.source.base_url
            && base_url.trim().is_empty()
        {
            bail!("source.base_url in {} must not be empty", path.display());
        }

        for (key, raw) in [
            ("source.timeout", self.source.timeout.as_deref()),
            ("demo.data_latency", self.demo.data_latency.as_deref()),
            ("demo.detail_latency", self.demo.detail_latency.as_deref()),
        ] {
            let Some(raw) = raw else { continue };
            let parsed =
                parse_duration(raw).with_context(|| format!("{key} in {}", path.display()))?;
            if key == "source.timeout" && parsed <= Duration::ZERO {
                bail!("{key} in {} must be positive, got {raw}", path.display());
            }
        }

        if self.demo.copies == Some(0) {
            bail!("demo.copies in {} must be at least 1", path.display());
        }

        if let Some(columns) = &self.ui.columns
            && let Some(index) = columns.iter().position(|column| column.trim().is_empty())
        {
            bail!(
                "ui.columns[{index}] in {} must name a field",
                path.display()
            );
        }

        if let Some(level) = &self.log.level {
            EnvFilter::try_new(level).map_err(|error| {
                anyhow!(
                    "log.level {level:?} in {} is not a valid filter ({error}); use trace, debug, info, warn or error",
                    path.display()
                )
            })?;
        }

        Ok(())
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source.kind.unwrap_or(SourceKind::Demo)
    }

    pub fn base_url(&self) -> &str {
        self.source
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.source.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn demo_seed(&self) -> u64 {
        self.demo.seed.unwrap_or(DEFAULT_SEED)
    }

    pub fn demo_copies(&self) -> usize {
        self.demo.copies.unwrap_or(DEFAULT_COPIES)
    }

    pub fn data_latency(&self) -> Result<Duration> {
        parse_duration(
            self.demo
                .data_latency
                .as_deref()
                .unwrap_or(DEFAULT_DATA_LATENCY),
        )
    }

    pub fn detail_latency(&self) -> Result<Duration> {
        parse_duration(
            self.demo
                .detail_latency
                .as_deref()
                .unwrap_or(DEFAULT_DETAIL_LATENCY),
        )
    }

    /// Pinned grid columns; empty means derive them from the rows.
    pub fn columns(&self) -> Vec<String> {
        self.ui.columns.clone().unwrap_or_default()
    }

    pub fn initial_filter(&self) -> &str {
        self.ui.initial_filter.as_deref().unwrap_or("")
    }

    /// `GRIDSCOPE_LOG` wins over `[log].level`.
    pub fn log_filter(&self) -> String {
        env::var(LOG_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .or_else(|| self.log.level.clone())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned())
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log.path {
            return Ok(PathBuf::from(path));
        }
        let data_root = dirs::data_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].path in the config file")
        })?;
        Ok(data_root.join(APP_NAME).join(format!("{APP_NAME}.log")))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# gridscope config\n# Place this file at: {}\n\nversion = 1\n\n[source]\n# \"demo\" serves generated rows; \"http\" talks to a grid service.\nkind = \"demo\"\nbase_url = \"{}\"\ntimeout = \"{}\"\n\n[demo]\nseed = {}\ncopies = {}\ndata_latency = \"{}\"\ndetail_latency = \"{}\"\n\n[ui]\n# Empty derives columns from the rows.\ncolumns = []\ninitial_filter = \"\"\n\n[log]\n# GRIDSCOPE_LOG overrides this.\nlevel = \"{}\"\n# Optional. Default is platform data dir (for example ~/.local/share/gridscope/gridscope.log)\n# path = \"/absolute/path/to/gridscope.log\"\n",
            path.display(),
            DEFAULT_BASE_URL,
            DEFAULT_TIMEOUT,
            DEFAULT_SEED,
            DEFAULT_COPIES,
            DEFAULT_DATA_LATENCY,
            DEFAULT_DETAIL_LATENCY,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("duration {raw:?} is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 300ms or 5s)")
}
