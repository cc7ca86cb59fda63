//! Container configuration.
//!
//! [`ContainerConfig`] controls how the container treats cycles, overriding
//! definitions, pre-instantiation and cross-thread waits. With the `config`
//! feature it can be loaded from JSON; it can always be read from environment
//! variables.

use std::env;
use std::time::Duration;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Default maximum resolution depth.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Container behaviour switches.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::ContainerConfig;
/// use std::time::Duration;
///
/// let config = ContainerConfig::default()
///     .with_circular_references(false)
///     .with_wait_timeout(Duration::from_secs(5));
/// assert!(!config.allow_circular_references);
/// assert_eq!(config.wait_timeout(), Some(Duration::from_secs(5)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerConfig {
    /// Break field-injection cycles with early references.
    pub allow_circular_references: bool,
    /// Keep a component whose after-init hooks replaced it after an early
    /// reference to it was already handed out.
    pub allow_raw_injection_despite_wrapping: bool,
    /// Let a later registration replace an earlier one with the same name.
    pub allow_definition_overriding: bool,
    /// Create every non-lazy component when the container is built.
    pub eager_init: bool,
    /// Maximum nesting of resolutions on one thread.
    pub max_depth: usize,
    /// How long to wait for another thread's creation, in milliseconds.
    pub wait_timeout_ms: Option<u64>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            allow_circular_references: true,
            allow_raw_injection_despite_wrapping: false,
            allow_definition_overriding: false,
            eager_init: true,
            max_depth: DEFAULT_MAX_DEPTH,
            wait_timeout_ms: None,
        }
    }
}

impl ContainerConfig {
    pub fn with_circular_references(mut self, allow: bool) -> Self {
        self.allow_circular_references = allow;
        self
    }

    pub fn with_raw_injection_despite_wrapping(mut self, allow: bool) -> Self {
        self.allow_raw_injection_despite_wrapping = allow;
        self
    }

    pub fn with_definition_overriding(mut self, allow: bool) -> Self {
        self.allow_definition_overriding = allow;
        self
    }

    pub fn with_eager_init(mut self, eager: bool) -> Self {
        self.eager_init = eager;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout_ms = Some(timeout.as_millis().min(u64::MAX as u128) as u64);
        self
    }

    /// The cross-thread wait deadline, if any.
    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }

    /// Parses a JSON document; missing fields keep their defaults.
    ///
    /// ```
    /// # #[cfg(feature = "config")] {
    /// use ferrous_ioc::ContainerConfig;
    ///
    /// let config = ContainerConfig::from_json(r#"{ "eager_init": false }"#).unwrap();
    /// assert!(!config.eager_init);
    /// assert!(config.allow_circular_references);
    /// # }
    /// ```
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Overrides fields from `{PREFIX}_ALLOW_CIRCULAR_REFERENCES`,
    /// `{PREFIX}_ALLOW_RAW_INJECTION`, `{PREFIX}_ALLOW_OVERRIDING`,
    /// `{PREFIX}_EAGER_INIT`, `{PREFIX}_MAX_DEPTH` and `{PREFIX}_WAIT_TIMEOUT_MS`.
    ///
    /// Unset or unparsable variables leave the field unchanged.
    pub fn from_env_prefix(prefix: &str) -> Self {
        Self::default().merge_env(prefix)
    }

    /// Applies environment overrides on top of `self`.
    pub fn merge_env(mut self, prefix: &str) -> Self {
        let var = |suffix: &str| env::var(format!("{prefix}_{suffix}")).ok();
        if let Some(v) = var("ALLOW_CIRCULAR_REFERENCES").and_then(|v| parse_bool(&v)) {
            self.allow_circular_references = v;
        }
        if let Some(v) = var("ALLOW_RAW_INJECTION").and_then(|v| parse_bool(&v)) {
            self.allow_raw_injection_despite_wrapping = v;
        }
        if let Some(v) = var("ALLOW_OVERRIDING").and_then(|v| parse_bool(&v)) {
            self.allow_definition_overriding = v;
        }
        if let Some(v) = var("EAGER_INIT").and_then(|v| parse_bool(&v)) {
            self.eager_init = v;
        }
        if let Some(v) = var("MAX_DEPTH").and_then(|v| v.trim().parse().ok()) {
            self.max_depth = v;
        }
        if let Some(v) = var("WAIT_TIMEOUT_MS").and_then(|v| v.trim().parse().ok()) {
            self.wait_timeout_ms = Some(v);
        }
        self
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
