//! Server configuration.
//!
//! Settings are resolved in three layers: built-in defaults, then
//! `FLASHSESSION_*` environment variables, then command-line arguments.
//! An environment variable that is unset or does not parse leaves the
//! previous value in place.

use crate::id::DEFAULT_ID_SIZE;
use crate::storage::{DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL, MAX_TTL};
use std::time::Duration;

pub const ENV_HOST: &str = "FLASHSESSION_HOST";
pub const ENV_PORT: &str = "FLASHSESSION_PORT";
pub const ENV_TTL_SECS: &str = "FLASHSESSION_TTL_SECS";
pub const ENV_SWEEP_INTERVAL_SECS: &str = "FLASHSESSION_SWEEP_INTERVAL_SECS";
pub const ENV_ID_SIZE: &str = "FLASHSESSION_ID_SIZE";

/// Which identifier strategy the server uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStrategy {
    /// `size` random bytes, base64 encoded
    Random { size: usize },
    /// Wrapping `u64` counter
    Sequential,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Session lifetime
    pub session_ttl: Duration,
    /// Interval between expiry sweeps
    pub sweep_interval: Duration,
    /// Identifier strategy
    pub ids: IdStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: crate::DEFAULT_HOST.to_string(),
            port: crate::DEFAULT_PORT,
            session_ttl: DEFAULT_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            ids: IdStrategy::Random {
                size: DEFAULT_ID_SIZE,
            },
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Run the server
    Serve(Config),
    /// Print usage and exit
    Help,
    /// Print the version and exit
    Version,
}

/// Errors from command-line parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} requires a value")]
    MissingValue(String),

    #[error("invalid value '{value}' for {flag}")]
    InvalidValue { flag: String, value: String },

    #[error("unknown argument: {0}")]
    UnknownArgument(String),
}

impl Config {
    /// Applies `FLASHSESSION_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Applies variables obtained through `lookup` on top of `self`.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST).filter(|h| !h.trim().is_empty()) {
            self.host = host.trim().to_string();
        }
        if let Some(port) = lookup(ENV_PORT).and_then(|v| v.trim().parse().ok()) {
            self.port = port;
        }
        if let Some(ttl) = lookup(ENV_TTL_SECS).and_then(|v| parse_secs(&v)) {
            self.session_ttl = ttl;
        }
        if let Some(interval) = lookup(ENV_SWEEP_INTERVAL_SECS).and_then(|v| parse_secs(&v)) {
            self.sweep_interval = interval;
        }
        if let Some(size) = lookup(ENV_ID_SIZE).and_then(|v| parse_size(&v)) {
            if let IdStrategy::Random { .. } = self.ids {
                self.ids = IdStrategy::Random { size };
            }
        }
        self
    }

    /// Parses command-line arguments (without the program name) on top of `self`.
    pub fn parse_args<I>(mut self, args: I) -> Result<Action, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--host" | "-h" => {
                    self.host = next_value(&mut args, &arg)?;
                }
                "--port" | "-p" => {
                    let value = next_value(&mut args, &arg)?;
                    self.port = value.parse().map_err(|_| invalid(&arg, &value))?;
                }
                "--ttl" => {
                    let value = next_value(&mut args, &arg)?;
                    self.session_ttl = parse_secs(&value).ok_or_else(|| invalid(&arg, &value))?;
                }
                "--sweep-interval" => {
                    let value = next_value(&mut args, &arg)?;
                    self.sweep_interval =
                        parse_secs(&value).ok_or_else(|| invalid(&arg, &value))?;
                }
                "--id-size" => {
                    let value = next_value(&mut args, &arg)?;
                    let size = parse_size(&value).ok_or_else(|| invalid(&arg, &value))?;
                    self.ids = IdStrategy::Random { size };
                }
                "--sequential" => {
                    self.ids = IdStrategy::Sequential;
                }
                "--help" => return Ok(Action::Help),
                "--version" | "-v" => return Ok(Action::Version),
                _ => return Err(ConfigError::UnknownArgument(arg.clone())),
            }
        }

        Ok(Action::Serve(self))
    }

    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn next_value<I>(args: &mut I, flag: &str) -> Result<String, ConfigError>
where
    I: Iterator<Item = String>,
{
    args.next()
        .ok_or_else(|| ConfigError::MissingValue(flag.to_string()))
}

fn invalid(flag: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        flag: flag.to_string(),
        value: value.to_string(),
    }
}

/// Whole seconds, at least one and at most [`MAX_TTL`].
fn parse_secs(value: &str) -> Option<Duration> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 && secs <= MAX_TTL.as_secs() => Some(Duration::from_secs(secs)),
        _ => None,
    }
}

/// Identifier size in bytes, at least one.
fn parse_size(value: &str) -> Option<usize> {
    match value.trim().parse::<usize>() {
        Ok(size) if size > 0 => Some(size),
        _ => None,
    }
}
