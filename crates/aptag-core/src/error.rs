// ── Provisioning error types ──
//
// Every variant is per-event: it is logged and the event is abandoned,
// never escalated to the process. Protocol-layer errors are classified
// by the step they happened in.

use thiserror::Error;

use crate::provisioner::Step;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum ProvisionError {
    // ── Intake ───────────────────────────────────────────────────────
    #[error("Malformed AP announcement: {reason}")]
    Decode { reason: String },

    // ── Lookup ───────────────────────────────────────────────────────
    #[error("No tag mapping for AP MAC {mac}")]
    UnmappedIdentity { mac: String },

    #[error("WLC '{name}' not found in config")]
    UnknownController { name: String },

    // ── Payload ──────────────────────────────────────────────────────
    #[error("Cannot build configuration payload: {reason}")]
    Payload { reason: String },

    // ── Session ──────────────────────────────────────────────────────
    #[error("Failed to connect to WLC at {address}: {reason}")]
    Connect { address: String, reason: String },

    #[error("Transport error during {step}: {reason}")]
    Transport { step: Step, reason: String },

    #[error("Controller rejected {step}: {message}")]
    ProtocolFailure { step: Step, message: String },

    #[error("{step} timed out after {timeout_secs}s")]
    Timeout { step: Step, timeout_secs: u64 },
}

// ── Conversion from protocol-layer errors ───────────────────────────

impl ProvisionError {
    /// Classify a failure to open a session on `address`.
    pub fn connect(address: impl Into<String>, err: aptag_netconf::Error) -> Self {
        match err {
            aptag_netconf::Error::Timeout { timeout_secs } => Self::Timeout {
                step: Step::Open,
                timeout_secs,
            },
            other => Self::Connect {
                address: address.into(),
                reason: other.to_string(),
            },
        }
    }

    /// Classify a failure on an already open session.
    pub fn transport(step: Step, err: aptag_netconf::Error) -> Self {
        match err {
            aptag_netconf::Error::Timeout { timeout_secs } => Self::Timeout { step, timeout_secs },
            other => Self::Transport {
                step,
                reason: other.to_string(),
            },
        }
    }
}
