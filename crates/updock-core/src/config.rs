//! Configuration types for hosts, checks and scheduling

use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

pub use updock_api::requests::DEFAULT_RUNTIME_PORT;

use crate::error::CoreError;

/// Identity of the host the daemon itself runs on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalHost {
    /// Hostname the local runtime is registered under
    pub hostname: String,
    /// Port recorded for the local host row
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    DEFAULT_RUNTIME_PORT
}

impl LocalHost {
    #[must_use]
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
        }
    }

    /// Whether `hostname` designates the local runtime
    #[must_use]
    pub fn is_local(&self, hostname: &str) -> bool {
        hostname == self.hostname || hostname == "localhost"
    }
}

impl Default for LocalHost {
    fn default() -> Self {
        Self::new("localhost", DEFAULT_RUNTIME_PORT)
    }
}

/// Tuning for host probes and scans
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Bound on the TCP liveness probe of a remote host
    pub probe_timeout: Duration,
    /// Bound on one host scan within a fleet check
    pub host_scan_timeout: Duration,
    /// Ask the registry for pinned-tag digests instead of pulling
    pub registry_lookup: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(5),
            host_scan_timeout: Duration::from_secs(300),
            registry_lookup: true,
        }
    }
}

/// Time of day for the daily check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTime {
    hour: u32,
    minute: u32,
}

impl DailyTime {
    /// # Errors
    /// Returns `CoreError::Config` unless `hour < 24` and `minute < 60`
    pub fn new(hour: u32, minute: u32) -> Result<Self, CoreError> {
        if hour >= 24 || minute >= 60 {
            return Err(CoreError::Config(format!(
                "invalid daily check time {hour:02}:{minute:02}"
            )));
        }
        Ok(Self { hour, minute })
    }

    #[must_use]
    pub fn hour(self) -> u32 {
        self.hour
    }

    #[must_use]
    pub fn minute(self) -> u32 {
        self.minute
    }

    #[must_use]
    pub fn as_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl Default for DailyTime {
    fn default() -> Self {
        Self { hour: 0, minute: 0 }
    }
}

impl std::fmt::Display for DailyTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Check schedule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Minutes between interval checks, `0` disables the interval trigger
    pub interval_minutes: u32,
    /// Time of the daily check
    pub daily: DailyTime,
}

/// A host to register at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedHost {
    pub hostname: String,
    pub port: u16,
}

/// Parse a comma separated `host[:port]` list
///
/// Entries are trimmed, empty entries skipped, missing ports default to 2375.
///
/// # Errors
/// Returns `CoreError::Config` for a port that is not a valid `u16`
pub fn parse_host_list(raw: &str) -> Result<Vec<SeedHost>, CoreError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.rsplit_once(':') {
            Some((hostname, port)) => {
                let port = port.trim().parse::<u16>().map_err(|_| {
                    CoreError::Config(format!("invalid port in host entry '{entry}'"))
                })?;
                Ok(SeedHost {
                    hostname: hostname.trim().to_string(),
                    port,
                })
            }
            None => Ok(SeedHost {
                hostname: entry.to_string(),
                port: DEFAULT_RUNTIME_PORT,
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_list() {
        let hosts = parse_host_list(" nas:2376, pi ,, backup:2375 ").unwrap();
        assert_eq!(
            hosts,
            vec![
                SeedHost {
                    hostname: "nas".to_string(),
                    port: 2376
                },
                SeedHost {
                    hostname: "pi".to_string(),
                    port: 2375
                },
                SeedHost {
                    hostname: "backup".to_string(),
                    port: 2375
                },
            ]
        );
        assert!(parse_host_list("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_host_list_rejects_bad_port() {
        assert!(matches!(
            parse_host_list("nas:docker"),
            Err(CoreError::Config(_))
        ));
        assert!(parse_host_list("nas:70000").is_err());
    }

    #[test]
    fn test_daily_time_validation() {
        assert!(DailyTime::new(23, 59).is_ok());
        assert!(DailyTime::new(24, 0).is_err());
        assert!(DailyTime::new(3, 60).is_err());
        assert_eq!(DailyTime::new(4, 5).unwrap().to_string(), "04:05");
    }

    #[test]
    fn test_local_host_aliases() {
        let local = LocalHost::new("server1", 2375);
        assert!(local.is_local("server1"));
        assert!(local.is_local("localhost"));
        assert!(!local.is_local("nas"));
    }
}
