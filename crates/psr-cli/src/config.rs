// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use psr_app::ViewMode;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const CONFIG_VERSION: i64 = 1;
pub const APP_NAME: &str = "psr-dashboard";
pub const CONFIG_PATH_ENV: &str = "PSR_CONFIG_PATH";
pub const PORT_ENV: &str = "PORT";
pub const HOST_ENV: &str = "HOST";
const DEFAULT_PORT: u16 = 8050;
const DEFAULT_BIND: &str = "0.0.0.0";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            data: Data::default(),
            server: Server::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Data {
    pub path: Option<String>,
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub view: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
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
                    "config file {} has no version; add `version = 1` and put values under [data], [server], [ui], and [log]",
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
        if let Some(data_path) = &self.data.path
            && data_path.trim().is_empty()
        {
            bail!(
                "data.path in {} is empty; remove it to use {} or the default file",
                path.display(),
                psr_data::DATA_FILE_ENV
            );
        }

        if let Some(sheet) = &self.data.sheet
            && sheet.trim().is_empty()
        {
            bail!(
                "data.sheet in {} is empty; remove it to read the first worksheet",
                path.display()
            );
        }

        if let Some(port) = self.server.port
            && u16::try_from(port).map_or(true, |port| port == 0)
        {
            bail!(
                "server.port in {} must be between 1 and 65535, got {}",
                path.display(),
                port
            );
        }

        if let Some(view) = &self.ui.view
            && ViewMode::parse(view).is_none()
        {
            bail!(
                "ui.view in {} must be \"table\" or \"treemap\", got {:?}",
                path.display(),
                view
            );
        }

        if let Some(level) = &self.log.level {
            EnvFilter::try_new(level).with_context(|| {
                format!(
                    "log.level in {} is not a valid filter (for example \"info\" or \"psr_data=debug\")",
                    path.display()
                )
            })?;
        }

        Ok(())
    }

    /// `[data].path`, then `DATA_FILE_PATH`, then the annex file name in the
    /// working directory.
    pub fn data_path(&self) -> PathBuf {
        if let Some(path) = &self.data.path {
            return PathBuf::from(path);
        }
        match env::var_os(psr_data::DATA_FILE_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(psr_data::DEFAULT_DATA_FILE),
        }
    }

    pub fn sheet(&self) -> Option<&str> {
        self.data.sheet.as_deref()
    }

    pub fn bind(&self) -> String {
        if let Some(bind) = &self.server.bind {
            return bind.clone();
        }
        match env::var(HOST_ENV) {
            Ok(host) if !host.trim().is_empty() => host,
            _ => DEFAULT_BIND.to_owned(),
        }
    }

    pub fn port(&self) -> Result<u16> {
        if let Some(port) = self.server.port {
            return u16::try_from(port)
                .with_context(|| format!("server.port must be between 1 and 65535, got {port}"));
        }
        match env::var(PORT_ENV) {
            Ok(raw) if !raw.trim().is_empty() => parse_port(raw.trim())
                .with_context(|| format!("{PORT_ENV}={raw:?} is not a usable port")),
            _ => Ok(DEFAULT_PORT),
        }
    }

    pub fn view(&self) -> ViewMode {
        self.ui
            .view
            .as_deref()
            .and_then(ViewMode::parse)
            .unwrap_or(ViewMode::Table)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.log.file.as_deref().map(PathBuf::from)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# {APP_NAME} config\n# Place this file at: {}\n\nversion = 1\n\n[data]\n# Optional. Falls back to {} and then {:?} in the working directory\n# path = \"/absolute/path/to/annex.xlsx\"\n# Optional. Defaults to the first worksheet\n# sheet = \"Annex 3-A\"\n\n[server]\nbind = \"{DEFAULT_BIND}\"\nport = {DEFAULT_PORT}\n\n[ui]\n# \"table\" or \"treemap\"\nview = \"table\"\n\n[log]\nlevel = \"{DEFAULT_LOG_LEVEL}\"\n# Terminal mode only logs when a file is set\n# file = \"/tmp/{APP_NAME}.log\"\n",
            path.display(),
            psr_data::DATA_FILE_ENV,
            psr_data::DEFAULT_DATA_FILE,
        )
    }
}

pub fn parse_port(raw: &str) -> Result<u16> {
    match raw.parse::<u16>() {
        Ok(0) | Err(_) => bail!("port must be a number between 1 and 65535, got {raw:?}"),
        Ok(port) => Ok(port),
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, HOST_ENV, PORT_ENV, parse_port};
    use anyhow::Result;
    use psr_app::ViewMode;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
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

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(PORT_ENV);
            std::env::remove_var(HOST_ENV);
            std::env::remove_var(psr_data::DATA_FILE_ENV);
        }
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.port()?, 8050);
        assert_eq!(config.bind(), "0.0.0.0");
        assert_eq!(config.view(), ViewMode::Table);
        assert_eq!(config.log_level(), "info");
        assert_eq!(
            config.data_path(),
            PathBuf::from("PSR Annex 3-A Combined_Sheet_Corrected.xlsx")
        );
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[data]\npath = \"annex.xlsx\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[data], [server], [ui], and [log]"));
        Ok(())
    }

    #[test]
    fn v1_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[data]\npath = \"/srv/annex.xlsx\"\nsheet = \"Annex 3-A\"\n[server]\nbind = \"127.0.0.1\"\nport = 9000\n[ui]\nview = \"treemap\"\n[log]\nlevel = \"debug\"\nfile = \"/tmp/psr.log\"\n",
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.data_path(), PathBuf::from("/srv/annex.xlsx"));
        assert_eq!(config.sheet(), Some("Annex 3-A"));
        assert_eq!(config.bind(), "127.0.0.1");
        assert_eq!(config.port()?, 9000);
        assert_eq!(config.view(), ViewMode::Treemap);
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.log_file(), Some(PathBuf::from("/tmp/psr.log")));
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
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn invalid_values_are_rejected() -> Result<()> {
        let cases = [
            ("version = 1\n[server]\nport = 0\n", "server.port"),
            ("version = 1\n[server]\nport = 70000\n", "server.port"),
            ("version = 1\n[ui]\nview = \"grid\"\n", "ui.view"),
            ("version = 1\n[data]\nsheet = \" \"\n", "data.sheet"),
            ("version = 1\n[data]\npath = \"\"\n", "data.path"),
            ("version = 1\n[log]\nlevel = \"psr_data=loud\"\n", "log.level"),
        ];
        for (content, field) in cases {
            let (_temp, path) = write_config(content)?;
            let error = Config::load(&path).expect_err("invalid value should fail");
            assert!(
                error.to_string().contains(field),
                "expected {field} in {error:#}"
            );
        }
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("PSR_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("PSR_CONFIG_PATH");
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn default_path_lives_under_app_dir_without_env_override() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var("PSR_CONFIG_PATH");
        }
        let path = Config::default_path()?;
        assert!(path.ends_with("psr-dashboard/config.toml"));
        Ok(())
    }

    #[test]
    fn config_values_win_over_env_overrides() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) = write_config(
            "version = 1\n[data]\npath = \"/from/config.xlsx\"\n[server]\nbind = \"127.0.0.1\"\nport = 9000\n",
        )?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(psr_data::DATA_FILE_ENV, "/from/env.xlsx");
            std::env::set_var(PORT_ENV, "9100");
            std::env::set_var(HOST_ENV, "10.0.0.1");
        }
        let config = Config::load(&path)?;
        let resolved = (config.data_path(), config.port()?, config.bind());
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(psr_data::DATA_FILE_ENV);
            std::env::remove_var(PORT_ENV);
            std::env::remove_var(HOST_ENV);
        }
        assert_eq!(
            resolved,
            (PathBuf::from("/from/config.xlsx"), 9000, "127.0.0.1".to_owned())
        );
        Ok(())
    }

    #[test]
    fn env_overrides_apply_when_config_is_silent() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) = write_config("version = 1\n")?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(psr_data::DATA_FILE_ENV, "/from/env.xlsx");
            std::env::set_var(PORT_ENV, "9100");
            std::env::set_var(HOST_ENV, "10.0.0.1");
        }
        let config = Config::load(&path)?;
        let resolved = (config.data_path(), config.port()?, config.bind());
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(psr_data::DATA_FILE_ENV);
            std::env::remove_var(PORT_ENV);
            std::env::remove_var(HOST_ENV);
        }
        assert_eq!(
            resolved,
            (PathBuf::from("/from/env.xlsx"), 9100, "10.0.0.1".to_owned())
        );
        Ok(())
    }

    #[test]
    fn invalid_port_env_is_an_actionable_error() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(PORT_ENV, "eighty");
        }
        let result = Config::default().port();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(PORT_ENV);
        }
        let error = result.expect_err("non-numeric PORT should fail");
        assert!(format!("{error:#}").contains("PORT=\"eighty\""));
        Ok(())
    }

    #[test]
    fn parse_port_rejects_zero_and_garbage() -> Result<()> {
        assert_eq!(parse_port("8050")?, 8050);
        assert!(parse_port("0").is_err());
        assert!(parse_port("-1").is_err());
        assert!(parse_port("65536").is_err());
        Ok(())
    }

    #[test]
    fn example_config_includes_required_sections() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("version = 1"));
        for section in ["[data]", "[server]", "[ui]", "[log]"] {
            assert!(example.contains(section), "missing {section}");
        }
        let parsed: toml::Value = toml::from_str(&example)?;
        assert_eq!(parsed.get("version").and_then(toml::Value::as_integer), Some(1));
        Ok(())
    }
}
