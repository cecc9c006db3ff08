//! CLI error types with miette diagnostics.
//!
//! Only startup failures reach here. Per-event provisioning errors are
//! logged by the pipeline and never stop the process.

use miette::Diagnostic;
use thiserror::Error;

use aptag_config::ConfigError;
use aptag_core::ProvisionError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(aptag::no_config),
        help("Pass the file with --config <PATH> or set APTAG_CONFIG.")
    )]
    NoConfig { path: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(aptag::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(aptag::config), help("Check the JSON file contents and try again."))]
    Config(Box<figment::Error>),

    // ── Credentials ──────────────────────────────────────────────────
    #[error("{variable} is not set")]
    #[diagnostic(
        code(aptag::no_credentials),
        help("Export WLC_USER and WLC_PASSWORD with the controller login before starting.")
    )]
    NoCredentials { variable: &'static str },

    // ── Lookups ──────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(aptag::not_found), help("Add it to {section} in the config file."))]
    NotFound {
        resource_type: &'static str,
        identifier: String,
        section: &'static str,
    },

    // ── Message bus ──────────────────────────────────────────────────
    #[error("Could not subscribe to MQTT broker at {broker}")]
    #[diagnostic(
        code(aptag::mqtt),
        help("Check mqtt.broker and mqtt.port, and that the broker accepts client id '{client_id}'.")
    )]
    Mqtt {
        broker: String,
        client_id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Pipeline ─────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(aptag::provision))]
    Provision(ProvisionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Mqtt { .. } => exit_code::CONNECTION,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Library error → CliError mapping ─────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound { path } => CliError::NoConfig {
                path: path.display().to_string(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { variable } => CliError::NoCredentials { variable },
            ConfigError::Figment(err) => CliError::Config(err),
        }
    }
}

impl From<ProvisionError> for CliError {
    fn from(err: ProvisionError) -> Self {
        match err {
            ProvisionError::UnmappedIdentity { mac } => CliError::NotFound {
                resource_type: "AP MAC",
                identifier: mac,
                section: "ap-tag-map",
            },
            ProvisionError::UnknownController { name } => CliError::NotFound {
                resource_type: "WLC",
                identifier: name,
                section: "wireless-controllers",
            },
            other => CliError::Provision(other),
        }
    }
}
