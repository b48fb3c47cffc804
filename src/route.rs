use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default global topic carrying consumer registrations.
pub const DEFAULT_REGISTRATION_TOPIC: &str = "pagination-consumers";
/// Default global topic carrying consumer acknowledgments.
pub const DEFAULT_ACK_TOPIC: &str = "pagination-ack";
/// Default ceiling on how long an idle pagination may stay open (24h).
pub const DEFAULT_MAX_OPEN_MS: u64 = 24 * 60 * 60 * 1_000;

/// Errors raised while validating route configuration at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("route field '{field}' cannot be blank")]
    BlankField { field: &'static str },
    #[error("route '{input}' requires a positive repartition factor")]
    NonPositiveRepartitions { input: String },
    #[error("route '{input}' requires a positive {field}")]
    NonPositiveDuration {
        input: String,
        field: &'static str,
    },
    #[error("route '{input}' declares window {window_ms} ms larger than retention {retention_ms} ms")]
    WindowExceedsRetention {
        input: String,
        window_ms: u64,
        retention_ms: u64,
    },
    #[error("input topic '{input}' declared by more than one route")]
    DuplicateInput { input: String },
}

/// Static configuration for one reassembly route.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteConfig {
    pub input: String,
    pub output: String,
    pub repartitions: usize,
    pub retention_ms: u64,
    pub window_ms: u64,
    #[serde(default)]
    pub retain_duplicates: bool,
}

impl RouteConfig {
    pub fn validate(&self) -> Result<(), RouteError> {
        if self.input.trim().is_empty() {
            return Err(RouteError::BlankField { field: "input" });
        }
        if self.output.trim().is_empty() {
            return Err(RouteError::BlankField { field: "output" });
        }
        if self.repartitions == 0 {
            return Err(RouteError::NonPositiveRepartitions {
                input: self.input.clone(),
            });
        }
        if self.retention_ms == 0 {
            return Err(RouteError::NonPositiveDuration {
                input: self.input.clone(),
                field: "retention_ms",
            });
        }
        if self.window_ms == 0 {
            return Err(RouteError::NonPositiveDuration {
                input: self.input.clone(),
                field: "window_ms",
            });
        }
        if self.window_ms > self.retention_ms {
            return Err(RouteError::WindowExceedsRetention {
                input: self.input.clone(),
                window_ms: self.window_ms,
                retention_ms: self.retention_ms,
            });
        }
        Ok(())
    }

    /// Name of the repartition barrier derived from the input topic.
    pub fn repartition_name(&self) -> String {
        format!("{}-pagination-repartition", self.input)
    }
}

/// Application configuration: the global registration/ack topics plus one
/// entry per reassembly route.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_registration_topic")]
    pub registration_topic: String,
    #[serde(default = "default_ack_topic")]
    pub ack_topic: String,
    #[serde(default = "default_max_open_ms")]
    pub max_open_ms: u64,
    pub routes: Vec<RouteConfig>,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registration_topic.trim().is_empty() {
            return Err(RouteError::BlankField {
                field: "registration_topic",
            }
            .into());
        }
        if self.ack_topic.trim().is_empty() {
            return Err(RouteError::BlankField { field: "ack_topic" }.into());
        }
        let mut inputs = HashSet::new();
        for route in &self.routes {
            route.validate()?;
            if !inputs.insert(route.input.as_str()) {
                return Err(RouteError::DuplicateInput {
                    input: route.input.clone(),
                }
                .into());
            }
        }
        Ok(())
    }
}

fn default_registration_topic() -> String {
    DEFAULT_REGISTRATION_TOPIC.to_string()
}

fn default_ack_topic() -> String {
    DEFAULT_ACK_TOPIC.to_string()
}

fn default_max_open_ms() -> u64 {
    DEFAULT_MAX_OPEN_MS
}

/// Errors raised while loading the application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Invalid(#[from] RouteError),
}

/// Loads and validates the JSON application configuration.
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path_ref = path.as_ref();
    let payload = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
        path: path_ref.to_path_buf(),
        source,
    })?;
    let config: AppConfig =
        serde_json::from_str(&payload).map_err(|source| ConfigError::Parse {
            path: path_ref.to_path_buf(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}
