//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and known names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::backend::options::validate_url_prefix;
use crate::backend::BackendKind;
use crate::config::schema::ServerConfig;

/// A single semantic problem in a config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check a parsed config, collecting every problem.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push(ValidationError::new("server.host", "must not be empty"));
    }

    if let Err(e) = config.server.backend.parse::<BackendKind>() {
        errors.push(ValidationError::new("server.backend", e));
    }

    let [low, high] = config.server.port_range;
    if low == 0 || low > high {
        errors.push(ValidationError::new(
            "server.port_range",
            format!("expected 1 <= start <= end, got [{}, {}]", low, high),
        ));
    }

    if let Err(e) = validate_url_prefix(&config.mount.url_prefix) {
        errors.push(ValidationError::new("mount.url_prefix", e.to_string()));
    }

    for (field, dir) in [
        ("mount.web_modules_dir", &config.mount.web_modules_dir),
        ("mount.assets_dir", &config.mount.assets_dir),
    ] {
        if let Some(dir) = dir {
            if !dir.is_dir() {
                errors.push(ValidationError::new(
                    field,
                    format!("{} is not a directory", dir.display()),
                ));
            }
        }
    }

    if !matches!(
        config.observability.log_level.as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level {:?}", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
