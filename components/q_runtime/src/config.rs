//! Reactor configuration.
//!
//! Configuration can be built in code through [`ReactorBuilder`] or loaded
//! from a JSON document with [`ReactorConfig::from_json`]. Missing fields
//! fall back to their defaults.

use crate::error::{QError, QResult};
use crate::reactor::Reactor;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for a [`Reactor`].
///
/// # Examples
///
/// ```
/// use q_runtime::ReactorConfig;
///
/// let config = ReactorConfig::from_json(r#"{ "work_threads": 2 }"#).unwrap();
/// assert_eq!(config.work_threads, 2);
/// assert_eq!(config.thread_name, "q-worker");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReactorConfig {
    /// Number of threads in the background work pool
    pub work_threads: usize,
    /// Name prefix for background work threads
    pub thread_name: String,
    /// How long an idle loop waits for background completions, in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            work_threads: 4,
            thread_name: "q-worker".to_string(),
            poll_interval_ms: 10,
        }
    }
}

impl ReactorConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json(input: &str) -> QResult<Self> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is in range.
    pub fn validate(&self) -> QResult<()> {
        if self.work_threads == 0 {
            return Err(QError::InvalidConfig(
                "work_threads must be at least 1".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(QError::InvalidConfig(
                "poll_interval_ms must be at least 1".to_string(),
            ));
        }
        if self.thread_name.trim().is_empty() {
            return Err(QError::InvalidConfig(
                "thread_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The idle poll interval as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Builder for configuring and creating a reactor.
///
/// # Examples
///
/// ```
/// use q_runtime::ReactorBuilder;
///
/// let reactor = ReactorBuilder::new()
///     .work_threads(2)
///     .thread_name("io")
///     .build()
///     .unwrap();
/// assert_eq!(reactor.config().work_threads, 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReactorBuilder {
    config: ReactorConfig,
}

impl ReactorBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration.
    pub fn config(mut self, config: ReactorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the number of background work threads.
    pub fn work_threads(mut self, n: usize) -> Self {
        self.config.work_threads = n;
        self
    }

    /// Sets the name prefix for background work threads.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Sets how long an idle loop waits for background completions.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval_ms = interval.as_millis().max(1) as u64;
        self
    }

    /// Validates the configuration and builds the reactor.
    pub fn build(self) -> QResult<Reactor> {
        Reactor::with_config(self.config)
    }
}
