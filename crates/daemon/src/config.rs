//! Daemon configuration from environment variables
//!
//! | Variable | Default |
//! |---|---|
//! | `PORTPROBE_INSTANCES_FILE` | `~/.portprobe/instances.json` |
//! | `PORTPROBE_INTERVAL_SECS` | `5` |
//! | `PORTPROBE_UPSTREAM_PROXY` | unset (direct) |
//! | `PORTPROBE_HOST_TLD` | unset |
//! | `PORTPROBE_EMIT_UNCHANGED` | `false` |
//! | `PORTPROBE_LOG_FORMAT` | `pretty` |

use std::path::PathBuf;
use std::time::Duration;

use portprobe_core::application::constants::DEFAULT_SCHEDULE_INTERVAL;
use portprobe_core::error::{AppError, Result};

const DEFAULT_INSTANCES_FILE: &str = "~/.portprobe/instances.json";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Production: JSON structured logging
    Json,
    /// Development: Pretty formatting with colors
    Pretty,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub instances_file: PathBuf,
    pub interval: Duration,
    pub upstream_proxy: Option<String>,
    pub host_tld: Option<String>,
    pub emit_unchanged: bool,
    pub log_format: LogFormat,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let instances_file = var("PORTPROBE_INSTANCES_FILE")
            .unwrap_or_else(|| DEFAULT_INSTANCES_FILE.to_string());
        let instances_file = PathBuf::from(shellexpand::tilde(&instances_file).into_owned());

        let interval = match var("PORTPROBE_INTERVAL_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    AppError::Config(format!("PORTPROBE_INTERVAL_SECS is not a number: {}", raw))
                })?;
                if secs == 0 {
                    return Err(AppError::Config(
                        "PORTPROBE_INTERVAL_SECS must be at least 1".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_SCHEDULE_INTERVAL,
        };

        let emit_unchanged = match var("PORTPROBE_EMIT_UNCHANGED") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                AppError::Config(format!("PORTPROBE_EMIT_UNCHANGED is not a boolean: {}", raw))
            })?,
            None => false,
        };

        let log_format = match var("PORTPROBE_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            instances_file,
            interval,
            upstream_proxy: var("PORTPROBE_UPSTREAM_PROXY"),
            host_tld: var("PORTPROBE_HOST_TLD"),
            emit_unchanged,
            log_format,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
