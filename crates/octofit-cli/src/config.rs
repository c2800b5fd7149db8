// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use octofit_api::{DEFAULT_HOST_SUFFIX, EndpointContext};
use octofit_app::DEFAULT_RESOURCE;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub const APP_NAME: &str = "octofit";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_LOG_LEVEL: &str = "info";
const CODESPACE_ENV_VARS: [&str; 2] = ["CODESPACE_NAME", "REACT_APP_CODESPACE_NAME"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub table: Table,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            table: Table::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub codespace_name: Option<String>,
    pub host_suffix: Option<String>,
    pub base_url: Option<String>,
    pub resource: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            codespace_name: None,
            host_suffix: Some(DEFAULT_HOST_SUFFIX.to_owned()),
            base_url: None,
            resource: Some(DEFAULT_RESOURCE.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Table {
    pub columns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("OCTOFIT_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set OCTOFIT_CONFIG_PATH to the config file")
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
                    "config file {} has no version. Add `version = 1` and put values under [api], [table], and [log]",
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
        if let Some(timeout) = &self.api.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed.is_zero() {
                bail!(
                    "api.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(resource) = &self.api.resource
            && resource.trim_matches('/').trim().is_empty()
        {
            bail!("api.resource in {} must not be empty", path.display());
        }

        if let Some(columns) = &self.table.columns
            && columns.iter().any(|column| column.trim().is_empty())
        {
            bail!(
                "table.columns in {} must not contain empty names",
                path.display()
            );
        }

        if let Some(level) = &self.log.level {
            EnvFilter::try_new(level).with_context(|| {
                format!(
                    "log.level in {} is not a valid filter directive: {level:?}",
                    path.display()
                )
            })?;
        }

        Ok(())
    }

    /// Builds the endpoint context. `lookup` reads the environment; the
    /// config value wins, then the environment in declaration order. Empty
    /// values count as absent.
    pub fn endpoint_context(
        &self,
        resource_override: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> EndpointContext {
        let codespace_name = non_empty(self.api.codespace_name.clone()).or_else(|| {
            CODESPACE_ENV_VARS
                .iter()
                .find_map(|name| non_empty(lookup(*name)))
        });

        EndpointContext {
            codespace_name,
            host_suffix: self
                .api
                .host_suffix
                .clone()
                .unwrap_or_else(|| DEFAULT_HOST_SUFFIX.to_owned()),
            base_url: non_empty(self.api.base_url.clone()),
            resource: resource_override
                .map(str::to_owned)
                .unwrap_or_else(|| self.resource().to_owned()),
        }
    }

    pub fn resource(&self) -> &str {
        self.api.resource.as_deref().unwrap_or(DEFAULT_RESOURCE)
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn columns(&self) -> Option<Vec<String>> {
        self.table.columns.clone()
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(file) = &self.log.file {
            return Ok(PathBuf::from(file));
        }
        let data_root = dirs::data_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].file in the config")
        })?;
        Ok(data_root.join(APP_NAME).join(format!("{APP_NAME}.log")))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# octofit config\n# Place this file at: {}\n\nversion = 1\n\n[api]\n# Optional. Falls back to CODESPACE_NAME, then REACT_APP_CODESPACE_NAME.\n# codespace_name = \"my-codespace\"\nhost_suffix = \"{}\"\n# Optional. Overrides the codespace and localhost defaults.\n# base_url = \"http://localhost:8000\"\nresource = \"{}\"\ntimeout = \"{}\"\n\n[table]\n# Optional. Default is the keys of the first record.\n# columns = [\"id\", \"activity_type\", \"duration\"]\n\n[log]\nlevel = \"{}\"\n# Optional. Default is the platform data dir (for example ~/.local/share/octofit/octofit.log)\n# file = \"/absolute/path/to/octofit.log\"\n",
            path.display(),
            DEFAULT_HOST_SUFFIX,
            DEFAULT_RESOURCE,
            DEFAULT_TIMEOUT,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("timeout duration {raw:?} is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}

#[cfg(test)]
mod tests {
    use super::{Config, parse_duration};
    use anyhow::Result;
    use octofit_api::resolve_endpoint;
    use octofit_testkit::temp_config_path;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let (temp, path) = temp_config_path()?;
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect::<HashMap<_, _>>();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.resource(), "activities");
        assert_eq!(config.timeout()?, Duration::from_secs(10));
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.columns(), None);
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[api]\nresource = \"teams\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[api], [table], and [log]"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn v1_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[api]\nresource = \"teams\"\ntimeout = \"500ms\"\n[table]\ncolumns = [\"id\", \"name\"]\n[log]\nlevel = \"debug\"\nfile = \"/tmp/octofit-test.log\"\n",
        )?;
        let config = Config::load(&path)?;
        assert_eq!(config.resource(), "teams");
        assert_eq!(config.timeout()?, Duration::from_millis(500));
        assert_eq!(
            config.columns(),
            Some(vec!["id".to_owned(), "name".to_owned()])
        );
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.log_file()?, PathBuf::from("/tmp/octofit-test.log"));
        Ok(())
    }

    #[test]
    fn zero_timeout_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[api]\ntimeout = \"0s\"\n")?;
        let error = Config::load(&path).expect_err("zero timeout should fail");
        assert!(error.to_string().contains("must be positive"));
        Ok(())
    }

    #[test]
    fn empty_resource_and_columns_are_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[api]\nresource = \"/\"\n")?;
        let error = Config::load(&path).expect_err("empty resource should fail");
        assert!(error.to_string().contains("api.resource"));

        let (_temp, path) = write_config("version = 1\n[table]\ncolumns = [\"id\", \" \"]\n")?;
        let error = Config::load(&path).expect_err("blank column should fail");
        assert!(error.to_string().contains("table.columns"));
        Ok(())
    }

    #[test]
    fn bad_log_level_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[log]\nlevel = \"octofit=verbose\"\n")?;
        let error = Config::load(&path).expect_err("bad directive should fail");
        assert!(error.to_string().contains("log.level"));
        Ok(())
    }

    #[test]
    fn endpoint_is_local_without_codespace() {
        let context = Config::default().endpoint_context(None, env_of(&[]));
        assert_eq!(
            resolve_endpoint(&context),
            "http://localhost:8000/api/activities/"
        );
    }

    #[test]
    fn codespace_env_vars_are_checked_in_order() {
        let config = Config::default();

        let context = config.endpoint_context(
            None,
            env_of(&[
                ("CODESPACE_NAME", "primary"),
                ("REACT_APP_CODESPACE_NAME", "fallback"),
            ]),
        );
        assert_eq!(
            resolve_endpoint(&context),
            "https://primary-8000.app.github.dev/api/activities/"
        );

        let context = config.endpoint_context(
            None,
            env_of(&[
                ("CODESPACE_NAME", ""),
                ("REACT_APP_CODESPACE_NAME", "fallback"),
            ]),
        );
        assert_eq!(
            resolve_endpoint(&context),
            "https://fallback-8000.app.github.dev/api/activities/"
        );
    }

    #[test]
    fn config_codespace_and_base_url_take_precedence() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[api]\ncodespace_name = \"from-config\"\nhost_suffix = \"preview.app.dev\"\n",
        )?;
        let config = Config::load(&path)?;
        let context = config.endpoint_context(None, env_of(&[("CODESPACE_NAME", "from-env")]));
        assert_eq!(
            resolve_endpoint(&context),
            "https://from-config-8000.preview.app.dev/api/activities/"
        );

        let (_temp, path) =
            write_config("version = 1\n[api]\nbase_url = \"http://127.0.0.1:9000/\"\n")?;
        let config = Config::load(&path)?;
        let context = config.endpoint_context(Some("teams"), env_of(&[("CODESPACE_NAME", "x")]));
        assert_eq!(resolve_endpoint(&context), "http://127.0.0.1:9000/api/teams/");
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("OCTOFIT_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("OCTOFIT_CONFIG_PATH");
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn default_path_uses_config_toml_suffix_when_no_env_override() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var("OCTOFIT_CONFIG_PATH");
        }
        let path = Config::default_path()?;
        assert!(path.ends_with("config.toml"));
        Ok(())
    }

    #[test]
    fn default_log_file_lives_under_app_dir() -> Result<()> {
        let path = Config::default().log_file()?;
        assert!(path.ends_with("octofit/octofit.log"), "got {}", path.display());
        Ok(())
    }

    #[test]
    fn timeout_parses_ms_seconds_and_minutes() -> Result<()> {
        assert_eq!(parse_duration("500ms")?, Duration::from_millis(500));
        assert_eq!(parse_duration("5s")?, Duration::from_secs(5));
        assert_eq!(parse_duration("2m")?, Duration::from_secs(120));
        Ok(())
    }

    #[test]
    fn timeout_rejects_invalid_duration() {
        let error = parse_duration("soon").expect_err("invalid duration should fail");
        let message = error.to_string();
        assert!(
            message.contains("invalid duration") || message.contains("invalid timeout duration"),
            "unexpected message: {message}"
        );
    }

    #[test]
    fn timeout_minutes_overflow_is_an_error() {
        let error = parse_duration("307445734561825861m").expect_err("overflow should fail");
        assert!(error.to_string().contains("too large"), "unexpected message: {error}");
        assert_eq!(
            parse_duration("307445734561825860m").ok(),
            Some(std::time::Duration::from_secs(307_445_734_561_825_860 * 60))
        );
    }

    #[test]
    fn example_config_loads_as_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("version = 1"));
        assert!(example.contains("[api]"));
        assert!(example.contains("[table]"));
        assert!(example.contains("[log]"));

        std::fs::write(&path, example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.resource(), "activities");
        assert_eq!(config.timeout()?, Duration::from_secs(10));
        Ok(())
    }
}
