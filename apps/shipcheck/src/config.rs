//! Configuration discovery and effective settings resolution.
//!
//! The validators read an optional `shipcheck.toml|yaml|yml` from the project
//! directory and merge it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `output`: `human`
//! - `runner`: `pnpm`
//! - `baseline.check|test`: `["check"]` / `["test"]`, `baseline.timeout_secs`: 300
//! - `app.dev`: `["dev", "--port", "{port}"]`, `app.host`: `localhost`,
//!   `app.port`: 3030, `app.health_path`: `/api/health`,
//!   `app.ready_timeout_secs`: 60, `app.route_retries`: 3, `app.logs_dir`: `logs`
//!
//! Overrides precedence: CLI > config file > defaults.
//!
//! The notifier is configured from the environment only (`NotifyConfig`).

use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const WEBHOOK_URL_ENV: &str = "PW_SPARK_WEBHOOK_URL";
pub const CHANNEL_ENV: &str = "PW_SPARK_CHANNEL";

/// Placeholder in `app.dev` replaced with the validation port.
const PORT_PLACEHOLDER: &str = "{port}";

#[derive(Debug, Default, Deserialize, Clone)]
/// Baseline section under `[baseline]`.
pub struct BaselineCfg {
    pub check: Option<Vec<String>>,
    pub test: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// App validation section under `[app]`.
pub struct AppCfg {
    pub dev: Option<Vec<String>>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub health_path: Option<String>,
    pub ready_timeout_secs: Option<u64>,
    pub route_retries: Option<u32>,
    pub logs_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `shipcheck.toml|yaml`.
pub struct ShipcheckConfig {
    pub output: Option<String>,
    pub runner: Option<String>,
    pub baseline: Option<BaselineCfg>,
    pub app: Option<AppCfg>,
}

#[derive(Debug, Clone)]
/// Commands and limits for the baseline validator.
pub struct BaselineSettings {
    pub runner: String,
    pub check_args: Vec<String>,
    pub test_args: Vec<String>,
    pub timeout: Duration,
}

impl Default for BaselineSettings {
    fn default() -> Self {
        BaselineSettings {
            runner: "pnpm".into(),
            check_args: vec!["check".into()],
            test_args: vec!["test".into()],
            timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone)]
/// Server command, network contract, and polling limits for the app validator.
pub struct AppSettings {
    pub runner: String,
    pub dev_args: Vec<String>,
    pub host: String,
    pub port: u16,
    pub health_path: String,
    pub ready_timeout: Duration,
    pub poll_interval: Duration,
    pub route_retries: u32,
    pub retry_delay: Duration,
    pub logs_dir: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            runner: "pnpm".into(),
            dev_args: vec!["dev".into(), "--port".into(), PORT_PLACEHOLDER.into()],
            host: "localhost".into(),
            port: 3030,
            health_path: "/api/health".into(),
            ready_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
            route_retries: 3,
            retry_delay: Duration::from_secs(1),
            logs_dir: "logs".into(),
        }
    }
}

impl AppSettings {
    /// Dev server arguments with the port placeholder filled in.
    pub fn resolved_dev_args(&self) -> Vec<String> {
        let port = self.port.to_string();
        self.dev_args
            .iter()
            .map(|a| a.replace(PORT_PLACEHOLDER, &port))
            .collect()
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url(), self.health_path)
    }
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by the validators after applying precedence.
pub struct Effective {
    pub project_dir: PathBuf,
    pub output: String,
    pub baseline: BaselineSettings,
    pub app: AppSettings,
}

/// Load `ShipcheckConfig` from `shipcheck.toml` or `shipcheck.yaml|yml` if present.
///
/// An unreadable or malformed file is logged and treated as absent.
pub fn load_config(root: &Path) -> Option<ShipcheckConfig> {
    let toml_path = root.join("shipcheck.toml");
    if toml_path.exists() {
        let s = read_or_warn(&toml_path)?;
        return match toml::from_str(&s) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                warn!(path = %toml_path.display(), error = %e, "ignoring malformed config");
                None
            }
        };
    }
    for yml in ["shipcheck.yaml", "shipcheck.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = read_or_warn(&p)?;
            return match serde_yaml::from_str(&s) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    warn!(path = %p.display(), error = %e, "ignoring malformed config");
                    None
                }
            };
        }
    }
    None
}

fn read_or_warn(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read config");
            None
        }
    }
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
///
/// `project_dir` is made absolute when possible; a missing directory is left
/// for the validators to report.
pub fn resolve_effective(project_dir: &str, cli_output: Option<&str>) -> Effective {
    let raw = PathBuf::from(project_dir);
    let project_dir = fs::canonicalize(&raw).unwrap_or(raw);
    let cfg = load_config(&project_dir).unwrap_or_default();

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let mut baseline = BaselineSettings::default();
    let mut app = AppSettings::default();
    if let Some(runner) = cfg.runner {
        baseline.runner = runner.clone();
        app.runner = runner;
    }
    if let Some(b) = cfg.baseline {
        if let Some(v) = b.check {
            baseline.check_args = v;
        }
        if let Some(v) = b.test {
            baseline.test_args = v;
        }
        if let Some(secs) = b.timeout_secs {
            baseline.timeout = Duration::from_secs(secs);
        }
    }
    if let Some(a) = cfg.app {
        if let Some(v) = a.dev {
            app.dev_args = v;
        }
        if let Some(v) = a.host {
            app.host = v;
        }
        if let Some(v) = a.port {
            app.port = v;
        }
        if let Some(v) = a.health_path {
            app.health_path = v;
        }
        if let Some(secs) = a.ready_timeout_secs {
            app.ready_timeout = Duration::from_secs(secs);
        }
        if let Some(v) = a.route_retries {
            app.route_retries = v;
        }
        if let Some(v) = a.logs_dir {
            app.logs_dir = v;
        }
    }

    Effective {
        project_dir,
        output,
        baseline,
        app,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Webhook target resolved from the environment and CLI.
pub struct NotifyConfig {
    pub webhook_url: String,
    pub channel: Option<String>,
}

impl NotifyConfig {
    /// Resolve from the process environment.
    pub fn from_env(cli_channel: Option<&str>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), cli_channel)
    }

    /// Resolve using `lookup` for environment values. Empty values count as
    /// unset; `cli_channel` wins over the environment default.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        cli_channel: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        let webhook_url =
            non_empty(lookup(WEBHOOK_URL_ENV)).ok_or(ConfigError::MissingEnv(WEBHOOK_URL_ENV))?;
        let channel =
            non_empty(cli_channel.map(str::to_string)).or_else(|| non_empty(lookup(CHANNEL_ENV)));
        Ok(NotifyConfig {
            webhook_url,
            channel,
        })
    }
}
