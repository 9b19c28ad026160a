//! Configuration loading and types
//!
//! The daemon reads `updock.toml` and then applies environment overrides, so a
//! container deployment can be configured without a file.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use eyre::{WrapErr, eyre};
use serde::{Deserialize, Serialize};
use updock_core::{
    CheckConfig, CoreError, DEFAULT_RUNTIME_PORT, DailyTime, LocalHost, ScheduleConfig, SeedHost,
    parse_host_list,
};

/// Top-level configuration for the updock daemon
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Daemon server settings
    #[serde(default)]
    pub daemon: DaemonConfig,
    /// Inventory store
    #[serde(default)]
    pub store: StoreConfig,
    /// The host the daemon runs on
    #[serde(default)]
    pub local: LocalConfig,
    /// Remote hosts registered at startup
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Check triggers
    #[serde(default)]
    pub schedule: ScheduleSection,
    /// Probe and scan tuning
    #[serde(default)]
    pub check: CheckSection,
}

/// Daemon server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Address and port to bind to
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// `sqlite:` URL or `memory`
    #[serde(default = "default_store_url")]
    pub url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Name the local runtime is registered under, `localhost` if unset
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default = "default_runtime_port")]
    pub port: u16,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            hostname: None,
            port: DEFAULT_RUNTIME_PORT,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Register `hosts` at startup
    #[serde(default)]
    pub auto_add: bool,
    /// Comma separated `host[:port]` list
    #[serde(default)]
    pub hosts: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleSection {
    /// Minutes between interval checks, `0` disables them
    #[serde(default)]
    pub interval_minutes: u32,
    #[serde(default)]
    pub daily_hour: u32,
    #[serde(default)]
    pub daily_minute: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSection {
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
    #[serde(default = "default_host_scan_timeout")]
    pub host_scan_timeout_secs: u64,
    /// Resolve pinned tags through the registry instead of pulling
    #[serde(default = "default_registry_lookup")]
    pub registry_lookup: bool,
}

impl Default for CheckSection {
    fn default() -> Self {
        Self {
            probe_timeout_secs: default_probe_timeout(),
            host_scan_timeout_secs: default_host_scan_timeout(),
            registry_lookup: default_registry_lookup(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_store_url() -> String {
    "sqlite:updock.db".to_string()
}

fn default_runtime_port() -> u16 {
    DEFAULT_RUNTIME_PORT
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_host_scan_timeout() -> u64 {
    300
}

fn default_registry_lookup() -> bool {
    true
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .wrap_err_with(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Load from default paths or use defaults, then apply the environment
    ///
    /// # Errors
    /// Returns error if a config file is unreadable, an environment override
    /// does not parse, or the result fails validation
    pub fn load_default() -> eyre::Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn load_file() -> eyre::Result<Self> {
        // Check environment variable
        if let Ok(path) = std::env::var("UPDOCK_CONFIG") {
            return Self::load(&PathBuf::from(path));
        }

        // Try common paths
        let paths = [
            PathBuf::from("updock.toml"),
            PathBuf::from("/etc/updock/updock.toml"),
            dirs::config_dir()
                .map(|p| p.join("updock/updock.toml"))
                .unwrap_or_default(),
        ];

        for path in paths {
            if path.is_file() {
                tracing::info!(path = %path.display(), "loading config");
                return Self::load(&path);
            }
        }

        tracing::warn!("no config file found, using defaults");
        Ok(Config::default())
    }

    /// Apply environment overrides through `var`
    ///
    /// # Errors
    /// Returns error if a numeric override does not parse
    pub fn apply_env<F>(&mut self, var: F) -> eyre::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(hostname) = var("HOSTNAME").filter(|h| !h.trim().is_empty()) {
            self.local.hostname = Some(hostname.trim().to_string());
        }
        if let Some(raw) = var("LOCAL_PORT") {
            self.local.port = parse_env("LOCAL_PORT", &raw)?;
        }
        if let Some(raw) = var("AUTO_ADD_HOSTS") {
            self.remote.auto_add = raw.trim().eq_ignore_ascii_case("true");
        }
        if let Some(hosts) = var("REMOTE_HOSTS") {
            self.remote.hosts = hosts;
        }
        if let Some(raw) = var("CHECK_INTERVAL_MINUTES") {
            self.schedule.interval_minutes = parse_env("CHECK_INTERVAL_MINUTES", &raw)?;
        }
        if let Some(raw) = var("CRON_HOUR") {
            self.schedule.daily_hour = parse_env("CRON_HOUR", &raw)?;
        }
        if let Some(raw) = var("CRON_MINUTE") {
            self.schedule.daily_minute = parse_env("CRON_MINUTE", &raw)?;
        }
        if let Some(url) = var("DATABASE_URL") {
            self.store.url = url;
        }
        if let Some(raw) = var("PORT") {
            let port: u16 = parse_env("PORT", &raw)?;
            self.daemon.bind = format!("0.0.0.0:{port}");
        }
        // an explicit address wins over PORT
        if let Some(bind) = var("BIND") {
            self.daemon.bind = bind;
        }
        Ok(())
    }

    /// Check the settings the engine will reject later
    ///
    /// # Errors
    /// Returns the first invalid setting found
    pub fn validate(&self) -> eyre::Result<()> {
        self.schedule()?;
        self.seed_hosts()?;
        if self.check.probe_timeout_secs == 0 || self.check.host_scan_timeout_secs == 0 {
            return Err(eyre!("check timeouts must be at least one second"));
        }
        Ok(())
    }

    #[must_use]
    pub fn local_host(&self) -> LocalHost {
        let hostname = self
            .local
            .hostname
            .clone()
            .unwrap_or_else(|| "localhost".to_string());
        LocalHost::new(hostname, self.local.port)
    }

    /// # Errors
    /// Returns `CoreError::Config` for an out-of-range daily time
    pub fn schedule(&self) -> Result<ScheduleConfig, CoreError> {
        Ok(ScheduleConfig {
            interval_minutes: self.schedule.interval_minutes,
            daily: DailyTime::new(self.schedule.daily_hour, self.schedule.daily_minute)?,
        })
    }

    #[must_use]
    pub fn check(&self) -> CheckConfig {
        CheckConfig {
            probe_timeout: Duration::from_secs(self.check.probe_timeout_secs),
            host_scan_timeout: Duration::from_secs(self.check.host_scan_timeout_secs),
            registry_lookup: self.check.registry_lookup,
        }
    }

    /// Remote hosts to register at startup, empty unless `auto_add` is set
    ///
    /// # Errors
    /// Returns `CoreError::Config` for an entry with an invalid port
    pub fn seed_hosts(&self) -> Result<Vec<SeedHost>, CoreError> {
        if !self.remote.auto_add {
            return Ok(Vec::new());
        }
        parse_host_list(&self.remote.hosts)
    }
}

fn parse_env<T>(name: &str, raw: &str) -> eyre::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| eyre!("invalid {name}={raw:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.daemon.bind, "0.0.0.0:3000");
        assert_eq!(config.daemon.log_format, LogFormat::Pretty);
        assert_eq!(config.store.url, "sqlite:updock.db");
        assert_eq!(config.local_host(), LocalHost::new("localhost", 2375));
        assert_eq!(config.schedule().unwrap().interval_minutes, 0);
        assert!(config.seed_hosts().unwrap().is_empty());
        assert!(config.check().registry_lookup);
    }

    #[test]
    fn test_parse_toml() {
        let raw = r#"
            [daemon]
            bind = "127.0.0.1:9000"
            log_format = "json"

            [store]
            url = "memory"

            [local]
            hostname = "server1"

            [remote]
            auto_add = true
            hosts = "nas, pi:2376"

            [schedule]
            interval_minutes = 30
            daily_hour = 4
            daily_minute = 15

            [check]
            registry_lookup = false
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.daemon.log_format, LogFormat::Json);
        assert_eq!(config.daemon.log_level, "info");
        assert_eq!(config.store.url, "memory");
        assert_eq!(config.local_host(), LocalHost::new("server1", 2375));

        let seeds = config.seed_hosts().unwrap();
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[1].hostname, "pi");
        assert_eq!(seeds[1].port, 2376);

        let schedule = config.schedule().unwrap();
        assert_eq!(schedule.interval_minutes, 30);
        assert_eq!(schedule.daily.to_string(), "04:15");
        assert!(!config.check().registry_lookup);
        assert_eq!(config.check().host_scan_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("HOSTNAME", "server1"),
                ("LOCAL_PORT", "2376"),
                ("AUTO_ADD_HOSTS", "true"),
                ("REMOTE_HOSTS", "server2,server3:2377"),
                ("CHECK_INTERVAL_MINUTES", "15"),
                ("CRON_HOUR", "3"),
                ("CRON_MINUTE", "30"),
                ("DATABASE_URL", "sqlite:/data/updock.db"),
                ("PORT", "8080"),
            ]))
            .unwrap();

        assert_eq!(config.local_host(), LocalHost::new("server1", 2376));
        assert_eq!(config.seed_hosts().unwrap().len(), 2);
        assert_eq!(config.schedule.interval_minutes, 15);
        assert_eq!(config.schedule().unwrap().daily.to_string(), "03:30");
        assert_eq!(config.store.url, "sqlite:/data/updock.db");
        assert_eq!(config.daemon.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_bind_wins_over_port() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("PORT", "8080"), ("BIND", "127.0.0.1:9999")]))
            .unwrap();
        assert_eq!(config.daemon.bind, "127.0.0.1:9999");
    }

    #[test]
    fn test_auto_add_only_on_true() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("AUTO_ADD_HOSTS", "yes"), ("REMOTE_HOSTS", "nas")]))
            .unwrap();
        assert!(!config.remote.auto_add);
        assert!(config.seed_hosts().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_env_rejected() {
        let mut config = Config::default();
        assert!(config.apply_env(env(&[("CHECK_INTERVAL_MINUTES", "-5")])).is_err());
        assert!(config.apply_env(env(&[("LOCAL_PORT", "99999")])).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_schedule() {
        let mut config = Config::default();
        config.schedule.daily_hour = 24;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.remote.auto_add = true;
        config.remote.hosts = "nas:notaport".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_hostname_ignored() {
        let mut config = Config::default();
        config.apply_env(env(&[("HOSTNAME", "  ")])).unwrap();
        assert_eq!(config.local_host().hostname, "localhost");
    }
}
