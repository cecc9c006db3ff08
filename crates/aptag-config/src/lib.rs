//! Configuration for the aptag provisioner.
//!
//! JSON config file with an `APTAG_` environment overlay, validation,
//! credential resolution (`WLC_USER` / `WLC_PASSWORD`), and translation to
//! `aptag_core::ProvisionerConfig`. Everything here runs once at startup;
//! any error is fatal to the process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Json},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use aptag_core::{
    Credentials, HostKeyVerification, ProvisionerConfig, SessionSettings, SubscriptionConfig,
    TagTriple, WirelessController,
};

/// Environment variable holding the controller username.
pub const USER_VAR: &str = "WLC_USER";
/// Environment variable holding the controller password.
pub const PASSWORD_VAR: &str = "WLC_PASSWORD";
/// Prefix of environment overrides for config file keys.
pub const ENV_PREFIX: &str = "APTAG_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("environment variable {variable} is not set")]
    NoCredentials { variable: &'static str },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── JSON config structs ─────────────────────────────────────────────

/// Top-level config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Controllers that may be named in announcements. Order matters:
    /// the first entry with a given name wins.
    pub wireless_controllers: Vec<ControllerEntry>,

    /// AP MAC → tag triple.
    pub ap_tag_map: HashMap<String, TagTriple>,

    pub mqtt: MqttSettings,

    #[serde(default)]
    pub netconf: NetconfSettings,

    #[serde(default)]
    pub dispatch: DispatchSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ControllerEntry {
    pub name: String,
    pub port: u16,
    /// SHA-256 host-key fingerprint, e.g. `SHA256:nThbg6kXUpJWGl7E1IGOCspRomTxdCARLviKw6E5SY8`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct MqttSettings {
    pub broker: String,
    pub port: u16,
    pub client_id: String,
    pub topic: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetconfSettings {
    /// Per-step timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Accept host keys of controllers without a pinned fingerprint.
    #[serde(default = "default_true")]
    pub accept_unknown_host_keys: bool,

    /// Connect on the controller's configured port instead of 830.
    #[serde(default)]
    pub honor_controller_port: bool,
}

impl Default for NetconfSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            accept_unknown_host_keys: true,
            honor_controller_port: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DispatchSettings {
    /// Cap on concurrent provisioning runs. Unbounded when absent.
    pub max_in_flight: Option<usize>,
}

fn default_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

// ── Config loading ──────────────────────────────────────────────────

/// Load and validate the config file at `path`, with `APTAG_*`
/// environment overrides.
///
/// Nested keys are separated by `__` and `_` stands for `-`, so
/// `APTAG_MQTT__CLIENT_ID` overrides `mqtt.client-id`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let figment = Figment::new().merge(Json::file(path)).merge(
        Env::prefixed(ENV_PREFIX).map(|key| key.as_str().replace("__", ".").replace('_', "-").into()),
    );

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Reject values that would only fail later, per event.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, controller) in self.wireless_controllers.iter().enumerate() {
            if controller.name.trim().is_empty() {
                return Err(invalid(
                    format!("wireless-controllers[{i}].name"),
                    "must not be empty",
                ));
            }
            if controller.port == 0 {
                return Err(invalid(
                    format!("wireless-controllers[{i}].port"),
                    "must be non-zero",
                ));
            }
        }

        if self.mqtt.broker.trim().is_empty() {
            return Err(invalid("mqtt.broker", "must not be empty"));
        }
        if self.mqtt.port == 0 {
            return Err(invalid("mqtt.port", "must be non-zero"));
        }
        if self.mqtt.topic.trim().is_empty() {
            return Err(invalid("mqtt.topic", "must not be empty"));
        }
        if self.netconf.timeout_secs == 0 {
            return Err(invalid("netconf.timeout-secs", "must be non-zero"));
        }
        if self.dispatch.max_in_flight == Some(0) {
            return Err(invalid("dispatch.max-in-flight", "must be non-zero"));
        }
        Ok(())
    }

    /// Translate to the runtime form consumed by `aptag-core`.
    pub fn to_provisioner_config(&self) -> ProvisionerConfig {
        let host_keys = if self.netconf.accept_unknown_host_keys {
            HostKeyVerification::AcceptUnpinned
        } else {
            HostKeyVerification::PinnedOnly
        };

        ProvisionerConfig {
            controllers: self
                .wireless_controllers
                .iter()
                .map(|c| WirelessController {
                    name: c.name.clone(),
                    port: c.port,
                    host_key: c.host_key.clone(),
                })
                .collect(),
            tag_map: self.ap_tag_map.clone(),
            subscription: SubscriptionConfig {
                broker: self.mqtt.broker.clone(),
                port: self.mqtt.port,
                client_id: self.mqtt.client_id.clone(),
                topic: self.mqtt.topic.clone(),
            },
            session: SessionSettings {
                timeout: Duration::from_secs(self.netconf.timeout_secs),
                host_keys,
                honor_controller_port: self.netconf.honor_controller_port,
            },
            max_in_flight: self.dispatch.max_in_flight,
        }
    }
}

fn invalid(field: impl Into<String>, reason: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Read `WLC_USER` and `WLC_PASSWORD` from the process environment.
pub fn resolve_credentials() -> Result<Credentials, ConfigError> {
    resolve_credentials_with(|name| std::env::var(name).ok())
}

/// Resolve credentials through `lookup`. Both variables must be set; an
/// empty value is passed through to the controller as is.
pub fn resolve_credentials_with(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Credentials, ConfigError> {
    let read = |variable: &'static str| {
        lookup(variable).ok_or(ConfigError::NoCredentials { variable })
    };

    let username = read(USER_VAR)?;
    let password = SecretString::from(read(PASSWORD_VAR)?);
    Ok(Credentials { username, password })
}
